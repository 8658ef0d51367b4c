//! Portal member credentials.

use std::fmt;

use crate::error::CoreError;

/// A portal member id and password.
///
/// Owned by the caller. `Debug` never prints the password and the type is
/// not serializable.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    id: String,
    password: String,
}

impl Credentials {
    /// Creates credentials, rejecting empty fields.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCredentials` if either field is blank.
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        let password = password.into();

        if id.trim().is_empty() {
            return Err(CoreError::InvalidCredentials("member id is empty".to_string()));
        }
        if password.is_empty() {
            return Err(CoreError::InvalidCredentials("password is empty".to_string()));
        }

        Ok(Self { id, password })
    }

    /// The member id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}
