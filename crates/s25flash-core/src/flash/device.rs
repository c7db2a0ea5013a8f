//! Generic flash device trait
//!
//! Lets tools drive a bound handle without naming its transport and clock
//! types, e.g. through `&mut dyn FlashDevice`.

use super::FlashHandle;
use crate::error::Result;
use crate::programmer::{Clock, SpiMaster};

/// Address-based access to a flash device
///
/// All operations use 32-bit addresses and are blocking.
///
/// # Example
///
/// ```ignore
/// use s25flash_core::flash::FlashDevice;
///
/// fn read_first_sector<D: FlashDevice>(device: &mut D) -> Result<Vec<u8>> {
///     let mut buf = vec![0u8; device.erase_granularity() as usize];
///     device.read(0, &mut buf)?;
///     Ok(buf)
/// }
/// ```
pub trait FlashDevice {
    /// Get the usable flash size in bytes
    ///
    /// For a bound handle this is the part of the device the addressing
    /// mode can reach, which is less than the capacity in 3-byte mode on
    /// parts above 16 MiB.
    fn size(&self) -> u32;

    /// Get the erase block size in bytes
    ///
    /// All erase operations must be aligned to this size and be a multiple
    /// of this size.
    fn erase_granularity(&self) -> u32;

    /// Get the largest unit of a single program command
    fn page_size(&self) -> u32;

    /// Read flash contents into the provided buffer
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the read extends beyond flash size
    /// * `SpiTransferFailed` - If the transport fails
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Write data to flash
    ///
    /// The target region should be erased first (all bytes 0xFF).
    /// Page alignment is handled internally.
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the write extends beyond flash size
    /// * `ProgramCommandFailed`, `WriteEnableFailed`, `PollTimeout` - If a
    ///   program step fails
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Erase a region of flash
    ///
    /// # Errors
    /// * `MisalignedErase` - If address or length is not sector aligned
    /// * `AddressOutOfBounds` - If the erase extends beyond flash size
    /// * `EraseCommandFailed`, `WriteEnableFailed`, `PollTimeout` - If an
    ///   erase step fails
    fn erase(&mut self, addr: u32, len: u32) -> Result<()>;

    /// Check if a range is valid for this device
    fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        // Use u64 arithmetic to avoid truncation when len > u32::MAX
        let end = addr as u64 + len as u64;
        end <= self.size() as u64
    }
}

impl<M: SpiMaster + ?Sized, C: Clock> FlashDevice for FlashHandle<'_, M, C> {
    // Only the part the addressing mode can reach is usable
    fn size(&self) -> u32 {
        self.addressable_size()
    }

    fn erase_granularity(&self) -> u32 {
        self.sector_size()
    }

    fn page_size(&self) -> u32 {
        FlashHandle::page_size(self)
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        FlashHandle::read(self, addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        FlashHandle::write(self, addr, data)
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        FlashHandle::erase(self, addr, len)
    }

    fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        FlashHandle::is_valid_range(self, addr, len)
    }
}

/// Extension trait for FlashDevice that provides whole-device helpers
#[cfg(feature = "alloc")]
pub trait FlashDeviceExt: FlashDevice {
    /// Read the entire flash contents
    fn read_all(&mut self) -> Result<alloc::vec::Vec<u8>> {
        let size = self.size() as usize;
        let mut buf = alloc::vec![0u8; size];
        self.read(0, &mut buf)?;
        Ok(buf)
    }

    /// Erase the entire flash chip, sector by sector
    fn erase_all(&mut self) -> Result<()> {
        self.erase(0, self.size())
    }
}

#[cfg(feature = "alloc")]
impl<D: FlashDevice + ?Sized> FlashDeviceExt for D {}
