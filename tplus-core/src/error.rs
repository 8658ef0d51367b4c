//! Core error types for `tplus`.

use thiserror::Error;

/// Core error type for `tplus` model operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Credentials were incomplete.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}
