//! Error handling for the trigger CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Beacon core error: {0}")]
    Core(#[from] trigger_core::TriggerError),

    #[error("Radio error: {0}")]
    Radio(#[from] trigger_core::RadioError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
