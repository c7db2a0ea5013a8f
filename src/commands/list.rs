//! List commands implementation

use s25flash_core::chip::{self, manufacturer};

/// List all supported chips
pub fn list_chips() {
    println!("Supported flash chips:");
    println!();
    println!(
        "{:<16} {:>8} {:>8} {:>6} {:>14}",
        "Name", "Size", "Sector", "Page", "ID"
    );
    println!("{}", "-".repeat(56));

    for chip in chip::CHIPS {
        let id_str = if chip.secondary_id == 0 {
            format!("{:02X} {:04X} ----", manufacturer::SPANSION, chip.primary_id)
        } else {
            format!(
                "{:02X} {:04X} {:04X}",
                manufacturer::SPANSION,
                chip.primary_id,
                chip.secondary_id
            )
        };

        println!(
            "{:<16} {:>8} {:>8} {:>6} {:>14}",
            chip.name,
            format_size(chip.total_size()),
            format_size(chip.sector_size()),
            chip.page_size,
            id_str
        );
    }
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
