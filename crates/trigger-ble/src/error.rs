//! Error types for the advertising backends

use thiserror::Error;

/// Malformed advertising data handed to a backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdParseError {
    #[error("AD structure at offset {offset} has zero length")]
    EmptyStructure { offset: usize },

    #[error("AD structure at offset {offset} claims {length} bytes, {available} available")]
    Truncated {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("Service data structure at offset {offset} is shorter than its UUID")]
    MissingUuid { offset: usize },
}

impl From<AdParseError> for trigger_core::RadioError {
    fn from(err: AdParseError) -> Self {
        trigger_core::RadioError::data(err.to_string())
    }
}
