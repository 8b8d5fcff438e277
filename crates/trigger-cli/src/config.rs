//! Trigger CLI configuration management
//!
//! Configuration comes from, in increasing priority:
//! - built-in defaults
//! - `~/.config/trigger/trigger.toml` when it exists
//! - the file given with `--config`
//! - command line flags

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trigger_core::BroadcastConfig;

use crate::cli::Cli;
use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the trigger CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Controller timing, radio and addressing settings
    pub broadcast: BroadcastConfig,

    /// CLI-specific settings
    pub cli: CliConfig,
}

/// CLI-specific configuration options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Print events as JSON lines
    pub json_output: bool,

    /// Log advertisements instead of transmitting
    pub dry_run: bool,

    /// Bluetooth adapter name, BlueZ default when unset
    pub adapter: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Default per-user configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trigger").join("trigger.toml"))
    }

    /// File this invocation reads its configuration from, if any
    pub fn source_path(cli: &Cli) -> Option<PathBuf> {
        match &cli.config {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_path().filter(|path| path.exists()),
        }
    }

    /// Resolve the configuration for this invocation
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match Self::source_path(cli) {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli_overrides(cli);
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        self.cli.json_output |= cli.json;
        self.cli.dry_run |= cli.dry_run;
        if let Some(adapter) = &cli.adapter {
            self.cli.adapter = Some(adapter.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.broadcast.validate()?;
        if let Some(adapter) = &self.cli.adapter {
            if adapter.trim().is_empty() {
                return Err(CliError::Config("adapter name must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use trigger_core::{AddressMode, PowerLevel};

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [broadcast]
            burst_size = 5
            power_level = "neg20dbm"
            sweep_address = { kind = "vendor_prefixed", prefix = [1, 2, 3] }

            [cli]
            json_output = true
            "#,
        )
        .unwrap();

        assert_eq!(config.broadcast.burst_size, 5);
        assert_eq!(config.broadcast.burst_interval_ms, 100);
        assert_eq!(config.broadcast.power_level, PowerLevel::Neg20dBm);
        assert_eq!(
            config.broadcast.sweep_address,
            AddressMode::VendorPrefixed { prefix: [1, 2, 3] }
        );
        assert!(config.cli.json_output);
    }

    #[test]
    fn test_invalid_broadcast_config_is_rejected() {
        let result = AppConfig::from_toml("[broadcast]\nburst_interval_ms = 0\n");
        assert!(matches!(result, Err(CliError::Core(_))));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let cli = Cli::parse_from(["trigger", "--config", "/tmp/beacon.toml", "sweep"]);
        assert_eq!(
            AppConfig::source_path(&cli),
            Some(PathBuf::from("/tmp/beacon.toml"))
        );
    }

    #[test]
    fn test_resolve_reads_explicit_file() {
        let path = std::env::temp_dir().join(format!("trigger-{}.toml", std::process::id()));
        std::fs::write(&path, "[broadcast]\nburst_size = 4\n").unwrap();

        let cli = Cli::parse_from(["trigger", "--config", path.to_str().unwrap(), "burst"]);
        let config = AppConfig::resolve(&cli).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.broadcast.burst_size, 4);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["trigger", "--dry-run", "--adapter", "hci1", "single"]);
        let mut config = AppConfig::default();
        config.apply_cli_overrides(&cli);
        assert!(config.cli.dry_run);
        assert_eq!(config.cli.adapter.as_deref(), Some("hci1"));
        assert!(!config.cli.json_output);
    }
}
