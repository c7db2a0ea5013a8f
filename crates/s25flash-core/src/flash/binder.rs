//! Device detection and binding

use core::fmt;

use super::FlashHandle;
use crate::chip::{self, ChipId};
use crate::config::FlashConfig;
use crate::error::{Error, Result};
use crate::programmer::{Clock, SpiMaster};
use crate::protocol;

/// Bind a device from an already read identification response
///
/// `id` is the raw RDID response: manufacturer byte, primary id, secondary
/// id. Only the fixed offsets are parsed; the manufacturer byte is not
/// checked. In `Wide32WithBank` mode the bank register is configured here
/// and a failure of that command fails the bind.
pub fn bind<'a, M: SpiMaster + ?Sized, C: Clock>(
    master: &'a mut M,
    clock: C,
    id: &[u8],
    config: FlashConfig,
) -> Result<FlashHandle<'a, M, C>> {
    let chip_id = ChipId::parse(id).ok_or_else(|| {
        log::debug!("SF: Identifier response too short ({} bytes)", id.len());
        Error::InvalidIdentifier
    })?;

    let geometry = chip::lookup(chip_id.primary, chip_id.secondary).inspect_err(|_| {
        log::warn!(
            "SF: Unsupported SPANSION ID {:04x} {:04x}",
            chip_id.primary,
            chip_id.secondary
        );
    })?;
    let mut handle = FlashHandle::new(master, clock, geometry, config);

    log::info!(
        "SF: Detected {} with page size {}, total {}",
        geometry.name,
        geometry.page_size,
        Size(handle.size())
    );

    if handle.size() as u64 > config.addressing.max_size() {
        log::warn!(
            "SF: {} addressing reaches only the first {} of {}",
            config.addressing,
            Size(handle.addressable_size()),
            geometry.name
        );
    }

    if config.addressing.needs_bank_setup() {
        protocol::enable_extended_addressing(handle.master())?;
    }

    Ok(handle)
}

/// Read the identifier from the device and bind it
pub fn probe<'a, M: SpiMaster + ?Sized, C: Clock>(
    master: &'a mut M,
    clock: C,
    config: FlashConfig,
) -> Result<FlashHandle<'a, M, C>> {
    let id = protocol::read_id(master)?;
    log::debug!("SF: Got idcode {:02x?}", id);
    bind(master, clock, &id, config)
}

/// Byte count printed with a binary unit
struct Size(u32);

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes >= 1024 * 1024 && bytes.is_multiple_of(1024 * 1024) {
            write!(f, "{} MiB", bytes / (1024 * 1024))
        } else if bytes >= 1024 && bytes.is_multiple_of(1024) {
            write!(f, "{} KiB", bytes / 1024)
        } else {
            write!(f, "{} bytes", bytes)
        }
    }
}
