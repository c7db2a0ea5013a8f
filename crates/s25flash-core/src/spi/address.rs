//! Address width and addressing mode types

use super::opcodes;

/// Address width for SPI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 3-byte (24-bit) address - supports up to 16 MiB
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the number of addressable bytes (saturated to `u64`)
    pub const fn max_size(&self) -> u64 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 1 << 24,
            Self::FourByte => 1 << 32,
        }
    }

    /// Encode an address big-endian into the first `bytes()` bytes of `buf`
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        let be = address.to_be_bytes();
        let n = self.bytes() as usize;
        buf[..n].copy_from_slice(&be[4 - n..]);
    }
}

/// Operations whose opcode depends on the addressing mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlashOp {
    /// Page Program
    PageProgram,
    /// Sector Erase
    SectorErase,
    /// Fast Read
    FastRead,
}

/// How command addresses are formed for the bound device
///
/// This is fixed per hardware target and chosen once at configuration
/// time, never per call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressingMode {
    /// 3-byte addresses with the legacy opcodes
    #[default]
    #[cfg_attr(feature = "std", serde(rename = "narrow24"))]
    Narrow24,
    /// 4-byte addresses with the dedicated 4-byte opcodes
    #[cfg_attr(feature = "std", serde(rename = "wide32"))]
    Wide32,
    /// 4-byte addresses with the legacy opcodes, enabled once through
    /// the bank register's extended address bit
    #[cfg_attr(feature = "std", serde(rename = "wide32-bank"))]
    Wide32WithBank,
}

impl AddressingMode {
    /// Address width used for program, erase and read commands
    pub const fn address_width(self) -> AddressWidth {
        match self {
            Self::Narrow24 => AddressWidth::ThreeByte,
            Self::Wide32 | Self::Wide32WithBank => AddressWidth::FourByte,
        }
    }

    /// Opcode to issue for `op` in this mode
    pub const fn opcode(self, op: FlashOp) -> u8 {
        match (self, op) {
            (Self::Wide32, FlashOp::PageProgram) => opcodes::PP_4B,
            (Self::Wide32, FlashOp::SectorErase) => opcodes::SE_4B,
            (Self::Wide32, FlashOp::FastRead) => opcodes::FAST_READ_4B,
            (_, FlashOp::PageProgram) => opcodes::PP,
            (_, FlashOp::SectorErase) => opcodes::SE,
            (_, FlashOp::FastRead) => opcodes::FAST_READ,
        }
    }

    /// Whether binding must enable extended addressing in the bank register
    pub const fn needs_bank_setup(self) -> bool {
        matches!(self, Self::Wide32WithBank)
    }

    /// Number of bytes reachable through this mode's address field
    pub const fn max_size(self) -> u64 {
        self.address_width().max_size()
    }

    /// Short name as used in configuration files and on the command line
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Narrow24 => "narrow24",
            Self::Wide32 => "wide32",
            Self::Wide32WithBank => "wide32-bank",
        }
    }
}

impl core::fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
