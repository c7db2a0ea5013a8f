//! CLI command implementations
//!
//! Every command runs against an emulated S25FL part whose contents live
//! in an image file. The driver sees a real transport: it probes the chip,
//! binds a handle and issues the same command sequences it would on
//! hardware.

mod erase;
mod list;
mod probe;
mod read;
mod write;

pub use erase::run_erase;
pub use list::list_chips;
pub use probe::run_probe;
pub use read::run_read;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use s25flash_core::chip::{self, DeviceGeometry};
use s25flash_core::config::FlashConfig;
use s25flash_core::flash::{self, FlashHandle};
use s25flash_dummy::{DummyConfig, DummyFlash, SimClock};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Look up a chip by name, with a helpful error
pub fn find_chip(name: &str) -> Result<&'static DeviceGeometry, Box<dyn std::error::Error>> {
    chip::find_by_name(name).ok_or_else(|| {
        let names: Vec<_> = chip::CHIPS.iter().map(|c| c.name).collect();
        format!("Unknown chip '{}' (supported: {})", name, names.join(", ")).into()
    })
}

/// Create an emulated chip, loading its contents from `image` if it exists
pub fn open_emulator(
    chip_name: &str,
    image: Option<&Path>,
    config: &FlashConfig,
) -> Result<DummyFlash, Box<dyn std::error::Error>> {
    let geometry = find_chip(chip_name)?;
    let dummy_config = DummyConfig::for_chip(geometry).with_dual_chip(config.dual_chip);

    let mut flash = match image.map(fs::read) {
        Some(Ok(data)) => {
            if data.len() > dummy_config.size {
                return Err(format!(
                    "Image size ({} bytes) exceeds chip size ({} bytes)",
                    data.len(),
                    dummy_config.size
                )
                .into());
            }
            log::debug!("Loaded {} bytes of image data", data.len());
            DummyFlash::with_data(dummy_config, &data)
        }
        Some(Err(e)) if e.kind() == ErrorKind::NotFound => {
            log::info!("Image file not found, starting from a blank chip");
            DummyFlash::new(dummy_config)
        }
        Some(Err(e)) => return Err(e.into()),
        None => DummyFlash::new(dummy_config),
    };

    // Long writes would otherwise record millions of commands
    flash.set_command_log(false);
    Ok(flash)
}

/// Save the emulated chip contents back to the image file
pub fn save_image(flash: &DummyFlash, image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(image, flash.data())?;
    log::info!("Saved {} bytes to {:?}", flash.data().len(), image);
    Ok(())
}

/// Probe the emulated chip and bind a handle to it
pub fn bind<'a>(
    flash: &'a mut DummyFlash,
    clock: &'a SimClock,
    config: FlashConfig,
) -> Result<FlashHandle<'a, DummyFlash, &'a SimClock>, Box<dyn std::error::Error>> {
    let handle = flash::probe(flash, clock, config)?;
    println!(
        "Found: {} ({} bytes, {} byte sectors)",
        handle.name(),
        handle.size(),
        handle.sector_size()
    );
    Ok(handle)
}

/// Create a progress bar in the common style
pub fn progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Resolve an optional (start, length) pair against the chip size
pub fn resolve_range(
    start: Option<u32>,
    length: Option<u32>,
    size: u32,
) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let start = start.unwrap_or(0);
    if start > size {
        return Err(format!("Start address 0x{:08X} is beyond chip size 0x{:08X}", start, size).into());
    }
    let length = length.unwrap_or(size - start);
    if start as u64 + length as u64 > size as u64 {
        return Err(format!(
            "Range 0x{:08X}..0x{:08X} is outside chip bounds (0x{:08X})",
            start,
            start as u64 + length as u64,
            size
        )
        .into());
    }
    Ok((start, length))
}
