//! Session transport abstraction.
//!
//! A [`SessionTransport`] issues GET requests that share one cookie jar, so
//! a login followed by a page request is correlated by the server's session
//! cookie. A [`TransportFactory`] opens a fresh session for every refresh.
//!
//! The real implementation is [`HttpClient`]; tests script responses through
//! their own implementations of these traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::error::HttpError;
use crate::host::http::HttpClient;

// ============================================================================
// Transport Response
// ============================================================================

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body decoded as text.
    pub body: String,
}

impl TransportResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the header is present (case-insensitive name).
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name.to_ascii_lowercase().as_str())
    }
}

// ============================================================================
// Traits
// ============================================================================

/// GET requests within one cookie session.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Sends a GET request with query parameters and reads the whole body.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse, HttpError>;
}

/// Opens independent sessions.
pub trait TransportFactory: Send + Sync {
    /// Opens a new session with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    fn open(&self) -> Result<Box<dyn SessionTransport>, HttpError>;
}

// ============================================================================
// HTTP Implementation
// ============================================================================

#[async_trait]
impl SessionTransport for HttpClient {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse, HttpError> {
        let response = self.get_with_query(url, query).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Body(e.to_string()))?;

        debug!(status, len = body.len(), "Response body read");
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Opens a new cookie-backed [`HttpClient`] per session.
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
    timeout: Duration,
    allowed_domains: Option<Vec<String>>,
}

impl HttpTransportFactory {
    /// Creates a factory whose sessions use the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            allowed_domains: None,
        }
    }

    /// Restricts sessions to the given domains.
    #[must_use]
    pub fn allow_only(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }
}

impl TransportFactory for HttpTransportFactory {
    fn open(&self) -> Result<Box<dyn SessionTransport>, HttpError> {
        let mut client = HttpClient::with_timeout(self.timeout)?;
        if let Some(domains) = &self.allowed_domains {
            client = client.allow_only(domains.clone());
        }
        Ok(Box::new(client))
    }
}

// ============================================================================
// Tests
// ============================================================================
