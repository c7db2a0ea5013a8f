//! Protocol implementations
//!
//! This module contains the S25FL command sequences the engines in
//! `flash` are built from.

mod spansion;

pub use spansion::*;
