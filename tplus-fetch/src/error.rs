//! Fetch error types.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Fetch Step
// ============================================================================

/// Which request of the two-step portal exchange an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStep {
    /// The login request carrying the member credentials.
    Login,
    /// The follow-up "my page" request within the same session.
    UsagePage,
}

impl fmt::Display for FetchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::UsagePage => write!(f, "usage page"),
        }
    }
}

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for the portal session exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or non-2xx status at either step.
    #[error("Network error during {step}: {message}")]
    Network {
        /// The step that failed.
        step: FetchStep,
        /// What went wrong.
        message: String,
    },

    /// The login request completed but the portal did not confirm the session.
    #[error("Login rejected by portal")]
    AuthRejected,

    /// The exchange exceeded its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The exchange was cancelled by the caller.
    #[error("Fetch cancelled")]
    Cancelled,

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Maps a transport error at the given step.
    pub fn from_http(step: FetchStep, err: HttpError) -> Self {
        match err {
            HttpError::DomainNotAllowed(domain) => Self::DomainNotAllowed(domain),
            HttpError::InvalidUrl(url) => Self::InvalidUrl(url),
            HttpError::Request(e) => Self::Network {
                step,
                message: e.to_string(),
            },
            HttpError::Body(message) | HttpError::Build(message) => Self::Network { step, message },
        }
    }

    /// Returns true for transport-level failures.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns true if the failure is worth retrying on the next refresh
    /// without user intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout(_))
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be read as text.
    #[error("Unreadable response body: {0}")]
    Body(String),

    /// The client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Credential not found.
    #[error("Credential not found for {service}/{account}")]
    NotFound {
        /// Service name.
        service: String,
        /// Account name.
        account: String,
    },

    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => KeychainError::NotFound {
                service: String::new(),
                account: String::new(),
            },
            keyring::Error::Ambiguous(_) => {
                KeychainError::Other("Ambiguous credential entry".to_string())
            }
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}
