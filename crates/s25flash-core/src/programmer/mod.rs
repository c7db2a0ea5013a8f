//! Transport traits and abstractions
//!
//! This module defines the traits a SPI transport must implement so the
//! protocol engine can drive a flash chip through it.

mod clock;
mod traits;

pub use clock::*;
pub use traits::*;
