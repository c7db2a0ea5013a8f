//! Error types for s25flash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// SPI transfer failed
    SpiTransferFailed,
    /// Opcode is not supported by the transport or device
    OpcodeNotSupported,
    /// Exclusive access to the bus could not be obtained
    TransportClaimFailed,

    // Binding errors
    /// Identifier response is too short to contain primary and secondary ids
    InvalidIdentifier,
    /// No registry entry matches the identifier
    UnsupportedDevice {
        /// Primary identifier (bytes 1-2 of the RDID response)
        primary: u16,
        /// Secondary identifier (bytes 3-4 of the RDID response)
        secondary: u16,
    },
    /// Bank register write during binding failed
    BankSetupFailed,

    // Operation errors
    /// Write Enable command failed
    WriteEnableFailed,
    /// Page Program command failed
    ProgramCommandFailed {
        /// Device address of the failed chunk
        addr: u32,
    },
    /// Sector Erase command failed
    EraseCommandFailed {
        /// Device address of the failed sector
        addr: u32,
    },
    /// Busy bit did not clear within the timeout
    PollTimeout,

    // Validation errors
    /// Erase offset or length is not a multiple of the sector size
    MisalignedErase,
    /// Range extends beyond the addressable flash size
    AddressOutOfBounds,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::OpcodeNotSupported => write!(f, "SPI opcode not supported"),
            Self::TransportClaimFailed => write!(f, "unable to claim SPI bus"),
            Self::InvalidIdentifier => write!(f, "identifier response too short"),
            Self::UnsupportedDevice { primary, secondary } => {
                write!(
                    f,
                    "unsupported Spansion ID {:04x} {:04x}",
                    primary, secondary
                )
            }
            Self::BankSetupFailed => write!(f, "bank register write failed"),
            Self::WriteEnableFailed => write!(f, "enabling write failed"),
            Self::ProgramCommandFailed { addr } => {
                write!(f, "page program failed at address 0x{:08X}", addr)
            }
            Self::EraseCommandFailed { addr } => {
                write!(f, "sector erase failed at address 0x{:08X}", addr)
            }
            Self::PollTimeout => write!(f, "timed out waiting for device ready"),
            Self::MisalignedErase => {
                write!(f, "erase offset/length not multiple of sector size")
            }
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
