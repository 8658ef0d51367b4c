//! Portal errors.

use thiserror::Error;
use tplus_core::{CoreError, ReportStatus, UsageCategory, UsageReport};
use tplus_fetch::{FetchError, KeychainError};

// ============================================================================
// Parse Error
// ============================================================================

/// Why a single usage row could not be read.
///
/// Row errors never fail the extraction as a whole; the row's category is
/// left at zero and the error is collected alongside the record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The row has no `span.rate` element.
    #[error("row {row} ({category}): no rate element")]
    MissingRate {
        /// Row position within the container.
        row: usize,
        /// Category the row was classified as.
        category: UsageCategory,
    },

    /// The rate text is not exactly two `/`-separated parts.
    #[error("row {row}: expected used/total, got {text:?}")]
    MalformedPair {
        /// Row position within the container.
        row: usize,
        /// Whitespace-stripped rate text.
        text: String,
    },

    /// One side of the pair is not a finite number.
    #[error("row {row}: invalid number {value:?}")]
    InvalidNumber {
        /// Row position within the container.
        row: usize,
        /// The offending part.
        value: String,
    },

    /// One side of the pair is negative.
    #[error("row {row}: negative value {value}")]
    NegativeValue {
        /// Row position within the container.
        row: usize,
        /// The offending value.
        value: f64,
    },
}

// ============================================================================
// Portal Error
// ============================================================================

/// Errors from a portal refresh or login.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The session exchange failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No credentials are available.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Credentials were present but unusable.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(#[from] CoreError),

    /// Credential storage failed.
    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),

    /// A refresh for this account is already running.
    #[error("Refresh already in progress for {0}")]
    RefreshInProgress(String),

    /// Endpoint configuration is invalid.
    #[error("Invalid portal configuration: {0}")]
    InvalidConfig(String),
}

impl PortalError {
    /// Status a degraded report should carry for this error.
    pub fn report_status(&self) -> ReportStatus {
        match self {
            Self::Fetch(FetchError::AuthRejected) => ReportStatus::AuthRejected,
            Self::Fetch(FetchError::Timeout(_)) => ReportStatus::TimedOut,
            Self::Fetch(FetchError::Cancelled) => ReportStatus::Cancelled,
            Self::Fetch(_) => ReportStatus::NetworkError,
            Self::Keychain(_) | Self::InvalidConfig(_) => ReportStatus::LocalError,
            Self::NotLoggedIn | Self::InvalidCredentials(_) => ReportStatus::NotLoggedIn,
            Self::RefreshInProgress(_) => ReportStatus::Busy,
        }
    }

    /// A zero-usage report describing this failure.
    pub fn degraded_report(&self) -> UsageReport {
        UsageReport::degraded(self.report_status(), self.to_string())
    }

    /// Returns true if retrying with the same credentials is pointless.
    pub fn invalidates_credentials(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::AuthRejected))
    }
}
