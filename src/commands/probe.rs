//! Probe command implementation

use s25flash_core::config::FlashConfig;
use s25flash_core::flash;
use s25flash_core::protocol;

use super::open_emulator;

/// Probe an emulated chip and print what the driver detected
pub fn run_probe(chip_name: &str, config: FlashConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut emulator = open_emulator(chip_name, None, &config)?;
    let clock = emulator.clock();

    let id = protocol::read_id(&mut emulator)?;
    let handle = match flash::bind(&mut emulator, &clock, &id, config) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            return Err(Box::new(e));
        }
    };

    println!("Found flash chip:");
    println!("  Name:        {}", handle.name());
    println!(
        "  Size:        {} bytes ({} KiB)",
        handle.size(),
        handle.size() / 1024
    );
    println!("  Sector size: {} bytes", handle.sector_size());
    println!("  Page size:   {} bytes", handle.page_size());
    println!(
        "  ID:          {:02X} {:02X}{:02X} {:02X}{:02X}",
        id[0], id[1], id[2], id[3], id[4]
    );
    println!("  Addressing:  {}", handle.config().addressing);
    if handle.config().dual_chip {
        println!(
            "  Dual chip:   yes ({} byte program chunks)",
            handle.effective_page_size()
        );
    }
    if handle.addressable_size() < handle.size() {
        println!(
            "  Reachable:   first {} bytes only",
            handle.addressable_size()
        );
    }

    Ok(())
}
