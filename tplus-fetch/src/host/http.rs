//! HTTP client with tracing, cookie session, and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist for security
//! - A private cookie jar, so one client is one portal session
//! - Redirect following (reqwest default policy)

use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for tplus.
const USER_AGENT: &str = concat!("tplus/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, cookie session, and domain allowlist.
///
/// Cookies set by any response are replayed on later requests made through
/// the same client. Build a new client to start a new session.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner: client,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains (and their subdomains).
    #[must_use]
    pub fn allow_only(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request with query parameters.
    ///
    /// Parameter values are not recorded in traces.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is not allowed or the request fails.
    #[instrument(skip(self, query), fields(url = %url, params = query.len()))]
    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request");

        let response = self.inner.get(url).query(query).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
