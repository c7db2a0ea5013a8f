//! Read command implementation

use s25flash_core::config::FlashConfig;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::{bind, open_emulator, progress_bar, resolve_range};

/// Chunk size for reading, only used to drive the progress bar
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Run the read command
pub fn run_read(
    chip_name: &str,
    image: &Path,
    config: FlashConfig,
    output: &Path,
    start: Option<u32>,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut emulator = open_emulator(chip_name, Some(image), &config)?;
    let clock = emulator.clock();
    let mut handle = bind(&mut emulator, &clock, config)?;

    let (start, length) = resolve_range(start, length, handle.size())?;
    let mut data = vec![0u8; length as usize];

    let pb = progress_bar(length as u64, "Reading")?;
    let mut offset = 0usize;
    while offset < data.len() {
        let chunk_size = std::cmp::min(READ_CHUNK_SIZE, data.len() - offset);
        let chunk = &mut data[offset..offset + chunk_size];

        handle.read(start + offset as u32, chunk)?;

        offset += chunk_size;
        pb.set_position(offset as u64);
    }
    pb.finish_with_message("Read complete");

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}
