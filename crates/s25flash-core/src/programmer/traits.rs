//! Transport trait definitions

use core::ops::{Deref, DerefMut};

use crate::error::{Error, Result};
use crate::spi::SpiCommand;

/// SPI Master trait
///
/// This trait represents a transport that can execute SPI flash commands.
/// All calls are blocking and run to completion on the caller's thread.
///
/// ## Exclusive access
///
/// Multi-step sequences (write enable, program, poll, repeat) must not be
/// interleaved with other traffic. The engine brackets them with
/// `claim_bus()` / `release_bus()`; transports that own the bus outright
/// can keep the default implementations.
///
/// ## Example
///
/// ```ignore
/// impl SpiMaster for Spidev {
///     fn max_write_len(&self) -> usize {
///         4096
///     }
///
///     fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
///         let header = cmd.header();
///         self.transfer(&header, cmd.write_data, cmd.read_buf)
///             .map_err(|_| Error::SpiTransferFailed)
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         std::thread::sleep(std::time::Duration::from_micros(us as u64));
///     }
/// }
/// ```
pub trait SpiMaster {
    /// Get the maximum number of payload bytes in a single write transaction
    fn max_write_len(&self) -> usize;

    /// Execute a single SPI command
    ///
    /// The command contains all the information needed for the transaction:
    /// - `opcode`: The SPI command opcode
    /// - `address`: Optional address (with width)
    /// - `dummy_cycles`: Number of dummy clock cycles after address
    /// - `write_data`: Data to write after the header
    /// - `read_buf`: Buffer to stream read data into
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Obtain exclusive access to the bus
    fn claim_bus(&mut self) -> Result<()> {
        Ok(())
    }

    /// Give up exclusive access to the bus
    fn release_bus(&mut self) {}

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

// Blanket impl for boxed SPI masters to allow trait objects
#[cfg(feature = "alloc")]
impl SpiMaster for alloc::boxed::Box<dyn SpiMaster + Send> {
    fn max_write_len(&self) -> usize {
        (**self).max_write_len()
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn claim_bus(&mut self) -> Result<()> {
        (**self).claim_bus()
    }

    fn release_bus(&mut self) {
        (**self).release_bus()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Exclusive bus access held for the lifetime of the guard
///
/// The bus is released when the guard is dropped, so every exit path of a
/// multi-step sequence (including `?` returns) gives it back.
pub struct BusGuard<'a, M: SpiMaster + ?Sized> {
    master: &'a mut M,
}

impl<'a, M: SpiMaster + ?Sized> BusGuard<'a, M> {
    /// Claim the bus, failing with `TransportClaimFailed` if it is unavailable
    pub fn claim(master: &'a mut M) -> Result<Self> {
        if let Err(e) = master.claim_bus() {
            log::debug!("SF: Unable to claim SPI bus ({})", e);
            return Err(Error::TransportClaimFailed);
        }
        Ok(Self { master })
    }
}

impl<M: SpiMaster + ?Sized> Deref for BusGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.master
    }
}

impl<M: SpiMaster + ?Sized> DerefMut for BusGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.master
    }
}

impl<M: SpiMaster + ?Sized> Drop for BusGuard<'_, M> {
    fn drop(&mut self) {
        self.master.release_bus();
    }
}
