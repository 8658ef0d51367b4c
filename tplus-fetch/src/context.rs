//! Fetch context providing access to host APIs.
//!
//! The fetch context is handed to the portal client and pipeline and gives
//! unified access to the session transport, the keychain, and settings.

use std::sync::Arc;
use std::time::Duration;

use crate::host::http::DEFAULT_TIMEOUT_SECS;
use crate::host::keychain::{KeychainApi, SystemKeychain};
use crate::transport::{HttpTransportFactory, TransportFactory};

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Deadline for one complete refresh (both requests).
    pub timeout: Duration,
    /// Domains sessions may contact. `None` means unrestricted.
    pub allowed_domains: Option<Vec<String>>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            allowed_domains: None,
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts sessions to the given domains.
    #[must_use]
    pub fn allow_only(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    fn transport_factory(&self) -> HttpTransportFactory {
        let factory = HttpTransportFactory::new(self.timeout);
        match &self.allowed_domains {
            Some(domains) => factory.allow_only(domains.clone()),
            None => factory,
        }
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to the portal client, giving access to host APIs.
pub struct FetchContext {
    /// Opens a fresh cookie session per refresh.
    pub transports: Arc<dyn TransportFactory>,
    /// Secure credential storage.
    pub keychain: Arc<dyn KeychainApi>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the effective timeout for a refresh.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
pub struct FetchContextBuilder {
    transports: Option<Arc<dyn TransportFactory>>,
    keychain: Option<Arc<dyn KeychainApi>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            transports: None,
            keychain: None,
            settings: FetchSettings::default(),
        }
    }

    /// Sets the transport factory.
    #[must_use]
    pub fn transports(mut self, transports: Arc<dyn TransportFactory>) -> Self {
        self.transports = Some(transports);
        self
    }

    /// Sets the keychain implementation.
    #[must_use]
    pub fn keychain(mut self, keychain: Arc<dyn KeychainApi>) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let transports = self
            .transports
            .unwrap_or_else(|| Arc::new(self.settings.transport_factory()));

        FetchContext {
            transports,
            keychain: self.keychain.unwrap_or_else(|| Arc::new(SystemKeychain::new())),
            settings: self.settings,
        }
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
