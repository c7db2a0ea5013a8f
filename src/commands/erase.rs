//! Erase command implementation

use s25flash_core::config::FlashConfig;
use std::path::Path;

use super::write::erase_with_progress;
use super::{bind, open_emulator, save_image};

/// Run the erase command
///
/// Without `--start`/`--length` the whole reachable chip is erased, one
/// sector at a time.
pub fn run_erase(
    chip_name: &str,
    image: &Path,
    config: FlashConfig,
    start: Option<u32>,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut emulator = open_emulator(chip_name, Some(image), &config)?;
    let clock = emulator.clock();
    let mut handle = bind(&mut emulator, &clock, config)?;

    let (start, length) = match (start, length) {
        (Some(start), Some(length)) => (start, length),
        (Some(_), None) | (None, Some(_)) => {
            return Err("Both --start and --length must be specified for partial erase".into());
        }
        (None, None) => (0, handle.addressable_size()),
    };

    let sector = handle.sector_size();
    if start % sector != 0 || length % sector != 0 {
        return Err(format!(
            "Erase range must be aligned to the {} byte sector size",
            sector
        )
        .into());
    }
    if !handle.is_valid_range(start, length as usize) {
        return Err(format!(
            "Erase range 0x{:08X}..0x{:08X} is outside chip bounds (0x{:08X})",
            start,
            start as u64 + length as u64,
            handle.addressable_size()
        )
        .into());
    }

    erase_with_progress(&mut handle, start, length)?;
    drop(handle);
    save_image(&emulator, image)?;

    println!("Erased {} bytes starting at 0x{:08X}", length, start);
    Ok(())
}
