//! s25flash-core - Command-level protocol engine for Spansion S25FL NOR flash
//!
//! This crate implements chip identification, fast reads, page-granular
//! programming and sector-granular erasing for the S25FL family on top of
//! a raw SPI command transport. It is designed to be `no_std` compatible
//! for use in boot loaders and other embedded environments.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), the
//!   `Instant`-backed clock and TOML configuration loading
//! - `alloc` - Enable heap allocation for helpers like `read_all`
//!
//! # Example
//!
//! ```ignore
//! use s25flash_core::{flash, config::FlashConfig, programmer::StdClock};
//!
//! fn dump_boot_sector<M: SpiMaster>(master: &mut M) -> s25flash_core::Result<()> {
//!     let mut handle = flash::probe(master, StdClock::new(), FlashConfig::default())?;
//!     println!("Found: {} ({} bytes)", handle.name(), handle.size());
//!
//!     let mut buf = [0u8; 256];
//!     handle.read(0, &mut buf)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod chip;
pub mod config;
pub mod error;
pub mod flash;
pub mod programmer;
pub mod protocol;
pub mod spi;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
