//! Driver configuration
//!
//! The addressing mode and dual-chip wiring are properties of the hardware
//! target, so they are fixed here once and handed to the binder rather than
//! chosen per call. With the `std` feature the configuration can be loaded
//! from a TOML file:
//!
//! ```toml
//! addressing = "wide32-bank"
//! dual_chip = false
//!
//! [timeouts]
//! program_us = 10000
//! erase_us = 5000000
//! ```

use crate::spi::AddressingMode;

/// Completion polling budgets, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct Timeouts {
    /// Maximum time for one page program to complete
    pub program_us: u32,
    /// Delay between status polls while programming
    pub program_poll_us: u32,
    /// Maximum time for one sector erase to complete
    pub erase_us: u32,
    /// Delay between status polls while erasing
    pub erase_poll_us: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            // Page program: typical 0.7-3ms
            program_us: 10_000,
            program_poll_us: 10,
            // Sector erase: up to ~2.6s for 256 KiB sectors
            erase_us: 5_000_000,
            erase_poll_us: 10_000,
        }
    }
}

/// Fixed per-target driver configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct FlashConfig {
    /// How command addresses are formed
    pub addressing: AddressingMode,
    /// Two devices are wired in lockstep and programmed as one
    pub dual_chip: bool,
    /// Completion polling budgets
    pub timeouts: Timeouts,
}

impl FlashConfig {
    /// Create a configuration for the given addressing mode
    pub fn new(addressing: AddressingMode) -> Self {
        Self {
            addressing,
            ..Self::default()
        }
    }

    /// Set the dual-chip flag
    pub fn with_dual_chip(mut self, dual_chip: bool) -> Self {
        self.dual_chip = dual_chip;
        self
    }

    /// Replace the timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Error type for configuration loading
#[cfg(feature = "std")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(feature = "std")]
impl FlashConfig {
    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = FlashConfig::from_toml_str(
            r#"
            addressing = "wide32-bank"
            dual_chip = true

            [timeouts]
            program_us = 3000
            program_poll_us = 5
            erase_us = 2000000
            erase_poll_us = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.addressing, AddressingMode::Wide32WithBank);
        assert!(config.dual_chip);
        assert_eq!(config.timeouts.program_us, 3000);
        assert_eq!(config.timeouts.erase_poll_us, 1000);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = FlashConfig::from_toml_str("addressing = \"wide32\"").unwrap();
        assert_eq!(config.addressing, AddressingMode::Wide32);
        assert!(!config.dual_chip);
        assert_eq!(config.timeouts, Timeouts::default());

        let config = FlashConfig::from_toml_str("").unwrap();
        assert_eq!(config, FlashConfig::default());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = FlashConfig::from_toml_str("addressing = \"sixteen\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
