//! Usage state store.
//!
//! Holds the latest report per account. A report without portal data never
//! replaces one that had data. The last report that carried portal data can
//! be cached on disk for offline display.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tplus_core::UsageReport;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_report_cache_path, load_json, remove_file, save_json};

// ============================================================================
// Usage Store
// ============================================================================

/// State store for usage reports, keyed by account id.
pub struct UsageStore {
    reports: Arc<RwLock<HashMap<String, UsageReport>>>,
    cache_path: PathBuf,
}

impl Default for UsageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageStore {
    /// Creates a store caching to the default location.
    pub fn new() -> Self {
        Self::with_cache_path(default_report_cache_path())
    }

    /// Creates a store caching to `path`.
    pub fn with_cache_path(path: PathBuf) -> Self {
        Self {
            reports: Arc::new(RwLock::new(HashMap::new())),
            cache_path: path,
        }
    }

    /// The report cache file.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    // ========================================================================
    // Reports
    // ========================================================================

    /// Gets the latest report for an account.
    pub async fn get_report(&self, account: &str) -> Option<UsageReport> {
        self.reports.read().await.get(account).cloned()
    }

    /// Records a report for an account.
    ///
    /// A degraded report without data does not replace an earlier report
    /// that had data; it is only stored if nothing better is known.
    pub async fn set_report(&self, account: &str, report: UsageReport) {
        let mut reports = self.reports.write().await;

        let keep_existing = !report.status.has_data()
            && reports
                .get(account)
                .is_some_and(|existing| existing.status.has_data());
        if keep_existing {
            debug!(account = %account, status = ?report.status, "Keeping previous report");
        } else {
            reports.insert(account.to_string(), report);
        }
    }

    // ========================================================================
    // Disk Cache
    // ========================================================================

    /// Writes a report to the cache file if it carries portal data.
    ///
    /// Returns whether the report was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_cached(&self, report: &UsageReport) -> Result<bool, StoreError> {
        if !report.status.has_data() {
            debug!(status = ?report.status, "Not caching report without data");
            return Ok(false);
        }
        save_json(&self.cache_path, report).await?;
        info!(path = %self.cache_path.display(), "Cached usage report");
        Ok(true)
    }

    /// Reads the cached report, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_cached(&self) -> Result<Option<UsageReport>, StoreError> {
        match load_json(&self.cache_path).await {
            Ok(report) => Ok(Some(report)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Deletes the cache file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub async fn clear_cached(&self) -> Result<(), StoreError> {
        remove_file(&self.cache_path).await
    }
}

// ============================================================================
// Tests
// ============================================================================
