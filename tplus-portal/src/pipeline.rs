//! The refresh pipeline.
//!
//! One refresh resolves credentials, fetches the usage page, and extracts the
//! record. It runs under a deadline, can be cancelled by the caller, and at
//! most one refresh per account is in flight at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tplus_core::UsageReport;
use tplus_fetch::{FetchContext, FetchError};
use tracing::{debug, info, instrument, warn};

use crate::credentials::CredentialProvider;
use crate::endpoints::PortalEndpoints;
use crate::error::PortalError;
use crate::parser::extract_detailed;
use crate::session::SessionFetcher;

// ============================================================================
// Cancellation
// ============================================================================

/// Creates a connected cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Triggers cancellation.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels every signal created from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new signal tied to this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observes cancellation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = cancel_pair();
        signal
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when cancellation is requested.
    ///
    /// Pends forever if the handle is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// In-Flight Tracking
// ============================================================================

type InFlight = Arc<Mutex<HashSet<String>>>;

/// Marks an account as refreshing until dropped.
struct InFlightGuard {
    accounts: InFlight,
    account: String,
}

impl InFlightGuard {
    fn acquire(accounts: &InFlight, account: &str) -> Result<Self, PortalError> {
        let mut set = accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(account.to_string()) {
            return Err(PortalError::RefreshInProgress(account.to_string()));
        }
        Ok(Self {
            accounts: Arc::clone(accounts),
            account: account.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.account);
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs refreshes against the portal.
pub struct UsagePipeline {
    fetcher: SessionFetcher,
    credentials: Arc<dyn CredentialProvider>,
    timeout: Duration,
    in_flight: InFlight,
}

impl UsagePipeline {
    /// Creates a pipeline.
    pub fn new(
        fetcher: SessionFetcher,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            timeout,
            in_flight: Arc::default(),
        }
    }

    /// Creates a pipeline from a fetch context.
    pub fn from_context(
        ctx: &FetchContext,
        endpoints: PortalEndpoints,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self::new(
            SessionFetcher::from_context(ctx, endpoints),
            credentials,
            ctx.timeout(),
        )
    }

    /// The refresh deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one refresh.
    ///
    /// # Errors
    ///
    /// - `PortalError::NotLoggedIn` if no credentials are available
    /// - `PortalError::RefreshInProgress` if this account is already refreshing
    /// - `PortalError::Fetch` for rejection, network failure, timeout, or
    ///   cancellation
    #[instrument(skip_all)]
    pub async fn refresh(&self, cancel: &CancelSignal) -> Result<UsageReport, PortalError> {
        let credentials = self
            .credentials
            .credentials()
            .await?
            .ok_or(PortalError::NotLoggedIn)?;
        let _guard = InFlightGuard::acquire(&self.in_flight, credentials.id())?;

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled.into());
        }

        let page = tokio::select! {
            result = tokio::time::timeout(self.timeout, self.fetcher.fetch(&credentials)) => {
                result.map_err(|_| FetchError::Timeout(self.timeout))??
            }
            () = cancel.cancelled() => {
                debug!("Refresh cancelled");
                return Err(FetchError::Cancelled.into());
            }
        };

        let report = extract_detailed(&page).into_report().for_account(credentials.id());
        info!(status = ?report.status, "Refresh complete");
        Ok(report)
    }

    /// Runs one refresh and folds any failure into a degraded report.
    pub async fn report(&self, cancel: &CancelSignal) -> UsageReport {
        match self.refresh(cancel).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Refresh failed");
                e.degraded_report()
            }
        }
    }
}

impl std::fmt::Debug for UsagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsagePipeline")
            .field("fetcher", &self.fetcher)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
