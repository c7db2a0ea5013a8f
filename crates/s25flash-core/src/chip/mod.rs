//! Flash chip types and capability registry
//!
//! This module provides the geometry description of S25FL parts and the
//! static table used to match an identification response to one of them.

mod registry;
mod types;

pub use registry::*;
pub use types::*;
