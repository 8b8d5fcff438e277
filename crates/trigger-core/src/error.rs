//! Error types for the trigger beacon core

use thiserror::Error;

// ----------------------------------------------------------------------------
// Radio Errors
// ----------------------------------------------------------------------------

/// Failure of a single radio transmission attempt.
///
/// None of these are fatal: a failed tick is retried implicitly by the next
/// tick, which draws a fresh address and payload anyway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("Failed to set beacon config: {reason}")]
    ConfigFailed { reason: String },

    #[error("Failed to set beacon data: {reason}")]
    DataFailed { reason: String },

    #[error("Failed to start beacon: {reason}")]
    StartFailed { reason: String },
}

impl RadioError {
    pub fn config(reason: impl Into<String>) -> Self {
        RadioError::ConfigFailed {
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        RadioError::DataFailed {
            reason: reason.into(),
        }
    }

    pub fn start(reason: impl Into<String>) -> Self {
        RadioError::StartFailed {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Core Errors
// ----------------------------------------------------------------------------

/// Top-level error for the core crate
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Invalid broadcast configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),
}

impl TriggerError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        TriggerError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, TriggerError>;
