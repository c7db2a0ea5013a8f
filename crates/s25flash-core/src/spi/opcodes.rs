//! Spansion S25FL SPI flash opcodes
//!
//! Opcode values are protocol-fixed. Which of the 3-byte or 4-byte
//! variants gets used is decided by the configured `AddressingMode`.

use bitflags::bitflags;

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status and configuration registers
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Bank Register Read
pub const BRRD: u8 = 0x16;
/// Bank Register Write
pub const BRWR: u8 = 0x17;

// ============================================================================
// Identification
// ============================================================================

/// Read Identification (manufacturer + device id + extended id)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read
// ============================================================================

/// Fast Read with 3-byte address (one dummy byte)
pub const FAST_READ: u8 = 0x0B;
/// Fast Read with 4-byte address (one dummy byte)
pub const FAST_READ_4B: u8 = 0x0C;

/// Dummy clock cycles following the address of a fast read
pub const FAST_READ_DUMMY_CYCLES: u8 = 8;

// ============================================================================
// Program / erase
// ============================================================================

/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Page Program with 4-byte address
pub const PP_4B: u8 = 0x12;
/// Sector Erase with 3-byte address
pub const SE: u8 = 0xD8;
/// Sector Erase with 4-byte address
pub const SE_4B: u8 = 0xDC;

bitflags! {
    /// Status Register 1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u8 {
        /// Write In Progress / busy
        const WIP  = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Erase error occurred
        const E_ERR = 1 << 5;
        /// Programming error occurred
        const P_ERR = 1 << 6;
        /// Status Register Write Disable
        const SRWD = 1 << 7;
    }
}

bitflags! {
    /// Bank Address Register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BankRegister: u8 {
        /// Bank address bit A24 for 3-byte commands
        const BA24   = 1 << 0;
        /// Extended address enable: legacy opcodes take a 4-byte address
        const EXTADD = 1 << 7;
    }
}

impl StatusRegister {
    /// Returns true while a program or erase operation is in flight
    pub const fn is_busy(self) -> bool {
        self.contains(Self::WIP)
    }
}
