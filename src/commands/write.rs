//! Write command implementation

use s25flash_core::config::FlashConfig;
use s25flash_core::flash::FlashHandle;
use s25flash_core::programmer::{Clock, SpiMaster};
use std::path::Path;

use super::{bind, open_emulator, progress_bar, save_image};

/// Chunk size for writing and verifying, only used to drive the progress bars
const WRITE_CHUNK_SIZE: usize = 4096;

/// Run the write command
///
/// Unless `no_erase` is set, the sectors covering the target range are
/// read, erased and rewritten with the new data merged in, so bytes that
/// share a sector with the range keep their contents.
pub fn run_write(
    chip_name: &str,
    image: &Path,
    config: FlashConfig,
    input: &Path,
    start: u32,
    no_erase: bool,
    no_verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", data.len(), input);

    let mut emulator = open_emulator(chip_name, Some(image), &config)?;
    let clock = emulator.clock();
    let mut handle = bind(&mut emulator, &clock, config)?;

    if !handle.is_valid_range(start, data.len()) {
        return Err(format!(
            "File ({} bytes at 0x{:08X}) does not fit the addressable chip size ({} bytes)",
            data.len(),
            start,
            handle.addressable_size()
        )
        .into());
    }

    if no_erase {
        write_with_progress(&mut handle, start, &data)?;
    } else {
        let sector = handle.sector_size();
        let erase_start = start - start % sector;
        let end = start + data.len() as u32;
        let erase_end = end.div_ceil(sector) * sector;

        let mut merged = vec![0u8; (erase_end - erase_start) as usize];
        handle.read(erase_start, &mut merged)?;
        let at = (start - erase_start) as usize;
        merged[at..at + data.len()].copy_from_slice(&data);

        erase_with_progress(&mut handle, erase_start, erase_end - erase_start)?;
        write_with_progress(&mut handle, erase_start, &merged)?;
    }

    if !no_verify {
        verify_with_progress(&mut handle, start, &data)?;
    }

    drop(handle);
    save_image(&emulator, image)?;

    println!("Write complete!");
    Ok(())
}

/// Erase whole sectors with a progress bar
pub fn erase_with_progress<M: SpiMaster + ?Sized, C: Clock>(
    handle: &mut FlashHandle<'_, M, C>,
    start: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let sector = handle.sector_size();
    let pb = progress_bar(length as u64, "Erasing")?;

    let mut offset = 0u32;
    while offset < length {
        let chunk = std::cmp::min(sector, length - offset);
        handle.erase(start + offset, chunk)?;

        offset += chunk;
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Erase complete");
    Ok(())
}

/// Write data to flash with a progress bar
fn write_with_progress<M: SpiMaster + ?Sized, C: Clock>(
    handle: &mut FlashHandle<'_, M, C>,
    start: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(data.len() as u64, "Writing")?;

    for (i, chunk) in data.chunks(WRITE_CHUNK_SIZE).enumerate() {
        let offset = i * WRITE_CHUNK_SIZE;
        handle.write(start + offset as u32, chunk)?;
        pb.set_position((offset + chunk.len()) as u64);
    }

    pb.finish_with_message("Write complete");
    Ok(())
}

/// Verify flash contents against expected data with a progress bar
fn verify_with_progress<M: SpiMaster + ?Sized, C: Clock>(
    handle: &mut FlashHandle<'_, M, C>,
    start: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = vec![0u8; WRITE_CHUNK_SIZE];
    let pb = progress_bar(expected.len() as u64, "Verifying")?;

    for (i, expected_chunk) in expected.chunks(WRITE_CHUNK_SIZE).enumerate() {
        let offset = i * WRITE_CHUNK_SIZE;
        let chunk = &mut buf[..expected_chunk.len()];
        handle.read(start + offset as u32, chunk)?;

        if let Some(pos) = chunk.iter().zip(expected_chunk).position(|(a, b)| a != b) {
            pb.abandon_with_message("Verification failed!");
            return Err(format!(
                "Verification failed at offset 0x{:08X}: expected 0x{:02X}, got 0x{:02X}",
                start as usize + offset + pos,
                expected_chunk[pos],
                chunk[pos]
            )
            .into());
        }

        pb.set_position((offset + expected_chunk.len()) as u64);
    }

    pb.finish_with_message("Verification passed");
    Ok(())
}
