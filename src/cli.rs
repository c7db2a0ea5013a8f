//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use s25flash_core::spi::AddressingMode;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "s25flash")]
#[command(author, version, about = "Spansion S25FL flash image tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Driver configuration file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Addressing mode (overrides the configuration file)
    #[arg(long, value_enum, global = true)]
    pub mode: Option<ModeArg>,

    /// Two devices wired in lockstep (overrides the configuration file)
    #[arg(long, global = true)]
    pub dual_chip: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Addressing mode as given on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// 3-byte addresses, legacy opcodes
    Narrow24,
    /// 4-byte addresses, dedicated 4-byte opcodes
    Wide32,
    /// 4-byte addresses on legacy opcodes via the bank register
    #[value(name = "wide32-bank")]
    Wide32Bank,
}

impl From<ModeArg> for AddressingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Narrow24 => AddressingMode::Narrow24,
            ModeArg::Wide32 => AddressingMode::Wide32,
            ModeArg::Wide32Bank => AddressingMode::Wide32WithBank,
        }
    }
}

/// Emulated chip and its backing image
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Chip to emulate (see list-chips)
    #[arg(short, long)]
    pub chip: String,

    /// Image file holding the chip contents (missing file = blank chip)
    #[arg(long)]
    pub image: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported chips
    ListChips,

    /// Probe an emulated chip and show what the driver detects
    Probe {
        /// Chip to emulate (see list-chips)
        #[arg(short, long)]
        chip: String,
    },

    /// Read flash contents to file
    Read {
        #[command(flatten)]
        target: TargetArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Number of bytes to read (hex or decimal, default: to end of chip)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Write file to flash
    Write {
        #[command(flatten)]
        target: TargetArgs,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Don't erase before writing
        #[arg(long)]
        no_erase: bool,

        /// Don't read back and compare after writing
        #[arg(long)]
        no_verify: bool,
    },

    /// Erase flash sectors
    Erase {
        #[command(flatten)]
        target: TargetArgs,

        /// Start address for partial erase (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Length of region to erase (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },
}
