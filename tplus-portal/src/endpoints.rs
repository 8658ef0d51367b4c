//! Portal endpoint configuration.

use url::Url;

use crate::error::PortalError;

/// Login action; credentials go in the query string.
pub const LOGIN_URL: &str = "https://www.tplusmobile.com/view/mytplus/loginAction.do";

/// The "my page" that carries the usage section.
pub const USAGE_URL: &str = "https://www.tplusmobile.com/view/mytplus/getPrductrecomend.do";

/// Header whose presence on the login response signals success.
pub const SUCCESS_HEADER: &str = "Content-Language";

/// Query parameter carrying the member id.
pub const ID_PARAM: &str = "mberId";

/// Query parameter carrying the password.
pub const PASSWORD_PARAM: &str = "password";

// ============================================================================
// Endpoints
// ============================================================================

/// Where and how to talk to the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalEndpoints {
    /// Login action URL.
    pub login_url: String,
    /// Usage page URL, requested within the login session.
    pub usage_url: String,
    /// Header that marks a successful login.
    pub success_header: String,
}

impl Default for PortalEndpoints {
    fn default() -> Self {
        Self {
            login_url: LOGIN_URL.to_string(),
            usage_url: USAGE_URL.to_string(),
            success_header: SUCCESS_HEADER.to_string(),
        }
    }
}

impl PortalEndpoints {
    /// Replaces the login URL.
    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Replaces the usage page URL.
    #[must_use]
    pub fn with_usage_url(mut self, url: impl Into<String>) -> Self {
        self.usage_url = url.into();
        self
    }

    /// Replaces the success header name.
    #[must_use]
    pub fn with_success_header(mut self, header: impl Into<String>) -> Self {
        self.success_header = header.into();
        self
    }

    /// Checks that both URLs are absolute http(s) URLs and the header name is set.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<(), PortalError> {
        for (label, raw) in [("login_url", &self.login_url), ("usage_url", &self.usage_url)] {
            let url = Url::parse(raw)
                .map_err(|e| PortalError::InvalidConfig(format!("{label}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(PortalError::InvalidConfig(format!(
                    "{label}: unsupported scheme {}",
                    url.scheme()
                )));
            }
            if url.host_str().is_none() {
                return Err(PortalError::InvalidConfig(format!("{label}: missing host")));
            }
        }

        if self.success_header.trim().is_empty() {
            return Err(PortalError::InvalidConfig(
                "success_header must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
