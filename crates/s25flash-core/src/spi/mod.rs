//! SPI types and command structures
//!
//! This module provides types for representing SPI transactions,
//! addressing modes, and the S25FL opcode set.

mod address;
mod command;
pub mod opcodes;

pub use address::{AddressWidth, AddressingMode, FlashOp};
pub use command::{SpiCommand, MAX_HEADER_LEN};
pub use opcodes::{BankRegister, StatusRegister};
