//! s25flash - Spansion S25FL flash image tool
//!
//! Drives the S25FL command-level driver against an emulated chip backed
//! by an image file. The driver runs exactly as it would on hardware:
//! identification, bank setup, page-chunked programming with completion
//! polling and sector erase all go through the SPI transport.
//!
//! The addressing mode and dual-chip wiring come from an optional TOML
//! configuration file and can be overridden on the command line.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use s25flash_core::config::FlashConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = load_config(&cli)?;
    log::debug!("Using {:?}", config);

    match cli.command {
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
        Commands::Probe { chip } => commands::run_probe(&chip, config),
        Commands::Read {
            target,
            output,
            start,
            length,
        } => commands::run_read(&target.chip, &target.image, config, &output, start, length),
        Commands::Write {
            target,
            input,
            start,
            no_erase,
            no_verify,
        } => commands::run_write(
            &target.chip,
            &target.image,
            config,
            &input,
            start,
            no_erase,
            no_verify,
        ),
        Commands::Erase {
            target,
            start,
            length,
        } => commands::run_erase(&target.chip, &target.image, config, start, length),
    }
}

/// Build the driver configuration from the config file and CLI overrides
fn load_config(cli: &Cli) -> Result<FlashConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = FlashConfig::from_toml_file(path)
                .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
            log::info!("Loaded configuration from {:?}", path);
            config
        }
        None => FlashConfig::default(),
    };

    if let Some(mode) = cli.mode {
        config.addressing = mode.into();
    }
    if cli.dual_chip {
        config.dual_chip = true;
    }

    Ok(config)
}
