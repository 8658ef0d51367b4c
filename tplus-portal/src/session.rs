//! Two-step portal session.
//!
//! 1. GET the login action with the member id and password as query
//!    parameters. The portal answers 2xx either way; a successful login is
//!    recognised by the success header being present on the response.
//! 2. GET the usage page in the same cookie session.
//!
//! Step 2 is never issued unless step 1 succeeded.

use std::sync::Arc;

use tplus_core::Credentials;
use tplus_fetch::{
    FetchContext, FetchError, FetchStep, SessionTransport, TransportFactory, TransportResponse,
};
use tracing::{debug, info, instrument, warn};

use crate::endpoints::{ID_PARAM, PASSWORD_PARAM, PortalEndpoints};

// ============================================================================
// Session Fetcher
// ============================================================================

/// Fetches the usage page HTML.
#[derive(Clone)]
pub struct SessionFetcher {
    endpoints: PortalEndpoints,
    transports: Arc<dyn TransportFactory>,
}

impl SessionFetcher {
    /// Creates a fetcher over the given transport factory.
    pub fn new(endpoints: PortalEndpoints, transports: Arc<dyn TransportFactory>) -> Self {
        Self {
            endpoints,
            transports,
        }
    }

    /// Creates a fetcher using the context's transport factory.
    pub fn from_context(ctx: &FetchContext, endpoints: PortalEndpoints) -> Self {
        Self::new(endpoints, Arc::clone(&ctx.transports))
    }

    /// The endpoints in use.
    pub fn endpoints(&self) -> &PortalEndpoints {
        &self.endpoints
    }

    /// Logs in and returns the usage page body.
    ///
    /// # Errors
    ///
    /// - `FetchError::AuthRejected` if the login response lacks the success
    ///   header; the usage page is not requested.
    /// - `FetchError::Network` on transport failure or a non-2xx status at
    ///   either step.
    #[instrument(skip_all, fields(account = %credentials.id()))]
    pub async fn fetch(&self, credentials: &Credentials) -> Result<String, FetchError> {
        let session = self.open()?;
        self.login_with(session.as_ref(), credentials).await?;

        let page = session
            .get(&self.endpoints.usage_url, &[])
            .await
            .map_err(|e| FetchError::from_http(FetchStep::UsagePage, e))?;
        ensure_success(FetchStep::UsagePage, &page)?;

        debug!(len = page.body.len(), "Usage page fetched");
        Ok(page.body)
    }

    /// Runs the login step only, to verify credentials.
    ///
    /// # Errors
    ///
    /// Same as the login half of [`fetch`](Self::fetch).
    #[instrument(skip_all, fields(account = %credentials.id()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), FetchError> {
        let session = self.open()?;
        self.login_with(session.as_ref(), credentials).await
    }

    fn open(&self) -> Result<Box<dyn SessionTransport>, FetchError> {
        self.transports
            .open()
            .map_err(|e| FetchError::from_http(FetchStep::Login, e))
    }

    async fn login_with(
        &self,
        session: &dyn SessionTransport,
        credentials: &Credentials,
    ) -> Result<(), FetchError> {
        let query = [
            (ID_PARAM, credentials.id()),
            (PASSWORD_PARAM, credentials.password()),
        ];

        let response = session
            .get(&self.endpoints.login_url, &query)
            .await
            .map_err(|e| FetchError::from_http(FetchStep::Login, e))?;
        ensure_success(FetchStep::Login, &response)?;

        if !response.has_header(&self.endpoints.success_header) {
            warn!(
                header = %self.endpoints.success_header,
                "Login response missing success header"
            );
            return Err(FetchError::AuthRejected);
        }

        info!("Portal login accepted");
        Ok(())
    }
}

impl std::fmt::Debug for SessionFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFetcher")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn ensure_success(step: FetchStep, response: &TransportResponse) -> Result<(), FetchError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(FetchError::Network {
            step,
            message: format!("HTTP {}", response.status),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::{LOGIN_URL, SUCCESS_HEADER, USAGE_URL};
    use crate::test_support::{ScriptedTransports, accepted_login, rejected_login};

    fn creds() -> Credentials {
        Credentials::new("01012345678", "pa ss&word").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_runs_both_steps_in_one_session() {
        let transports = ScriptedTransports::new()
            .respond(accepted_login())
            .respond(TransportResponse::new(200, "<html>usage</html>"));
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        let body = fetcher.fetch(&creds()).await.unwrap();
        assert_eq!(body, "<html>usage</html>");

        let requests = transports.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, LOGIN_URL);
        assert_eq!(
            requests[0].query,
            vec![
                ("mberId".to_string(), "01012345678".to_string()),
                ("password".to_string(), "pa ss&word".to_string()),
            ]
        );
        assert_eq!(requests[1].url, USAGE_URL);
        assert!(requests[1].query.is_empty());
        assert_eq!(requests[0].session, requests[1].session);
    }

    #[tokio::test]
    async fn test_missing_header_stops_before_usage_page() {
        let transports = ScriptedTransports::new().respond(rejected_login());
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        let err = fetcher.fetch(&creds()).await.unwrap_err();
        assert!(matches!(err, FetchError::AuthRejected));
        assert_eq!(transports.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_header_match_is_case_insensitive() {
        let transports = ScriptedTransports::new()
            .respond(TransportResponse::new(200, "").with_header("content-language", "ko"));
        let fetcher = SessionFetcher::new(
            PortalEndpoints::default().with_success_header(SUCCESS_HEADER.to_uppercase()),
            transports.factory(),
        );
        assert!(fetcher.login(&creds()).await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_failure_at_login() {
        let transports = ScriptedTransports::new().fail("connection refused");
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        let err = fetcher.fetch(&creds()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Network {
                step: FetchStep::Login,
                ..
            }
        ));
        assert_eq!(transports.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_at_login_is_network() {
        let transports = ScriptedTransports::new()
            .respond(TransportResponse::new(503, "").with_header(SUCCESS_HEADER, "ko"));
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        let err = fetcher.fetch(&creds()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Network { step: FetchStep::Login, ref message } if message == "HTTP 503"
        ));
        assert_eq!(transports.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_usage_page_failure() {
        let transports = ScriptedTransports::new()
            .respond(accepted_login())
            .respond(TransportResponse::new(500, "oops"));
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        let err = fetcher.fetch(&creds()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Network {
                step: FetchStep::UsagePage,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_login_only_issues_one_request() {
        let transports = ScriptedTransports::new().respond(accepted_login());
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        fetcher.login(&creds()).await.unwrap();
        assert_eq!(transports.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_each_fetch_opens_new_session() {
        let transports = ScriptedTransports::new()
            .respond(accepted_login())
            .respond(TransportResponse::new(200, "a"))
            .respond(accepted_login())
            .respond(TransportResponse::new(200, "b"));
        let fetcher = SessionFetcher::new(PortalEndpoints::default(), transports.factory());

        fetcher.fetch(&creds()).await.unwrap();
        fetcher.fetch(&creds()).await.unwrap();

        let requests = transports.requests();
        assert_eq!(requests[0].session, requests[1].session);
        assert_ne!(requests[1].session, requests[2].session);
    }
}
