//! Refresh outcome types.
//!
//! A failed fetch and a structurally empty page both yield an all-zero
//! [`UsageRecord`]. [`ReportStatus`] says which of those happened, so a
//! genuine zero reading stays distinguishable from a degraded one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::usage::UsageRecord;

// ============================================================================
// Report Status
// ============================================================================

/// How a usage report was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every data row parsed.
    Fresh,
    /// The page parsed but some rows were malformed and left at zero.
    Partial,
    /// The page had no usage container (portal markup changed, or the
    /// session landed on a different page).
    NoUsageContainer,
    /// The usage container was present but held no data rows.
    NoUsageRows,
    /// Data rows were present but none of them could be read.
    Unreadable,
    /// No stored credentials.
    NotLoggedIn,
    /// The portal did not confirm the login.
    AuthRejected,
    /// Transport failure or unexpected HTTP status.
    NetworkError,
    /// The refresh exceeded its deadline.
    TimedOut,
    /// The refresh was cancelled by the caller.
    Cancelled,
    /// Another refresh for the same account was already running.
    Busy,
    /// Local failure before any request, such as keychain access or a bad
    /// portal setting.
    LocalError,
}

impl ReportStatus {
    /// Returns true if the record carries real portal data.
    pub fn has_data(&self) -> bool {
        matches!(self, Self::Fresh | Self::Partial)
    }

    /// Returns true for anything other than a clean read.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Fresh)
    }

    /// Short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Fresh => "up to date",
            Self::Partial => "some rows could not be read",
            Self::NoUsageContainer => "usage section not found on portal page",
            Self::NoUsageRows => "usage section is empty",
            Self::Unreadable => "no usage row could be read",
            Self::NotLoggedIn => "not logged in",
            Self::AuthRejected => "login rejected by portal",
            Self::NetworkError => "network error",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
            Self::Busy => "refresh already in progress",
            Self::LocalError => "local configuration or keychain error",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Usage Report
// ============================================================================

/// The result of one fetch-and-extract refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    /// The usage reading (all zero when degraded without data).
    pub usage: UsageRecord,
    /// How the reading was obtained.
    pub status: ReportStatus,
    /// Account the report belongs to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Number of data rows that failed to parse.
    #[serde(default)]
    pub skipped_rows: usize,
    /// Error detail for degraded reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the report was produced.
    pub fetched_at: DateTime<Utc>,
}

impl UsageReport {
    /// Creates a report from a parsed page.
    ///
    /// The status is [`ReportStatus::Partial`] if any row was skipped, or
    /// [`ReportStatus::Unreadable`] if rows were skipped and nothing was read.
    pub fn from_page(usage: UsageRecord, skipped_rows: usize) -> Self {
        let status = match (skipped_rows, usage.is_zero()) {
            (0, _) => ReportStatus::Fresh,
            (_, true) => ReportStatus::Unreadable,
            (_, false) => ReportStatus::Partial,
        };

        Self {
            usage,
            status,
            account_id: None,
            skipped_rows,
            detail: None,
            fetched_at: Utc::now(),
        }
    }

    /// Creates a zero-valued report for a failed refresh.
    pub fn degraded(status: ReportStatus, detail: impl Into<String>) -> Self {
        Self {
            usage: UsageRecord::zero(),
            status,
            account_id: None,
            skipped_rows: 0,
            detail: Some(detail.into()),
            fetched_at: Utc::now(),
        }
    }

    /// Attaches the account id.
    #[must_use]
    pub fn for_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usage::{CategoryUsage, UsageCategory};

    #[test]
    fn test_from_page_status() {
        let usage = UsageRecord::zero().with(UsageCategory::Voice, CategoryUsage::new(1.0, 2.0));
        assert_eq!(UsageReport::from_page(usage, 0).status, ReportStatus::Fresh);
        assert_eq!(UsageReport::from_page(usage, 1).status, ReportStatus::Partial);
    }

    #[test]
    fn test_degraded_zero_is_distinguishable() {
        let genuine = UsageReport::from_page(UsageRecord::zero(), 0);
        let failed = UsageReport::degraded(ReportStatus::NetworkError, "connection refused");

        assert_eq!(genuine.usage, failed.usage);
        assert!(genuine.status.has_data());
        assert!(!failed.status.has_data());
        assert!(failed.status.is_degraded());
        assert_eq!(failed.detail.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_all_rows_skipped_has_no_data() {
        let report = UsageReport::from_page(UsageRecord::zero(), 3);
        assert_eq!(report.status, ReportStatus::Unreadable);
        assert!(!report.status.has_data());
        assert!(report.status.is_degraded());
    }

    #[test]
    fn test_local_error_has_no_data() {
        assert!(!ReportStatus::LocalError.has_data());
        assert_eq!(
            ReportStatus::LocalError.to_string(),
            "local configuration or keychain error"
        );
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ReportStatus::NoUsageContainer).unwrap();
        assert_eq!(json, "\"no_usage_container\"");
    }
}
