//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown settings key.
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    /// A settings value could not be parsed.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The settings key.
        key: String,
        /// What was wrong.
        message: String,
    },
}

impl StoreError {
    /// Returns true if the file was simply not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
