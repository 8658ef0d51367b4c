//! Credential providers.
//!
//! A refresh needs a member id and password. Where they come from is up to
//! the host: the system keychain, environment variables, or values held in
//! memory. [`ChainedCredentials`] tries several sources in order.

use std::sync::Arc;

use async_trait::async_trait;
use tplus_core::Credentials;
use tplus_fetch::KeychainApi;
use tplus_fetch::host::keychain::services;
use tracing::{debug, info};

use crate::error::PortalError;

/// Default environment variable for the member id.
pub const ID_ENV: &str = "TPLUS_ID";

/// Default environment variable for the password.
pub const PASSWORD_ENV: &str = "TPLUS_PASSWORD";

// ============================================================================
// Provider Trait
// ============================================================================

/// A source of portal credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns the credentials, or `None` if this source has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the source exists but cannot be read or holds
    /// unusable values.
    async fn credentials(&self) -> Result<Option<Credentials>, PortalError>;
}

// ============================================================================
// Static
// ============================================================================

/// Credentials held in memory.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Wraps existing credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn credentials(&self) -> Result<Option<Credentials>, PortalError> {
        Ok(Some(self.credentials.clone()))
    }
}

// ============================================================================
// Environment
// ============================================================================

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Credentials from environment variables.
///
/// Both variables must be set; one without the other counts as absent.
#[derive(Clone)]
pub struct EnvCredentials {
    id_var: String,
    password_var: String,
    lookup: Lookup,
}

impl EnvCredentials {
    /// Reads [`ID_ENV`] and [`PASSWORD_ENV`] from the process environment.
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Uses a custom variable lookup.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            id_var: ID_ENV.to_string(),
            password_var: PASSWORD_ENV.to_string(),
            lookup: Arc::new(lookup),
        }
    }

    /// Reads different variable names.
    #[must_use]
    pub fn with_vars(mut self, id_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        self.id_var = id_var.into();
        self.password_var = password_var.into();
        self
    }

    fn read(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.is_empty())
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("id_var", &self.id_var)
            .field("password_var", &self.password_var)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn credentials(&self) -> Result<Option<Credentials>, PortalError> {
        let (Some(id), Some(password)) = (self.read(&self.id_var), self.read(&self.password_var))
        else {
            return Ok(None);
        };
        Ok(Some(Credentials::new(id, password)?))
    }
}

// ============================================================================
// Keychain
// ============================================================================

/// Credentials whose password lives in the keychain.
///
/// The member id is not secret and is supplied by the caller (usually from
/// settings); the password is stored under the portal service with the
/// member id as the account.
#[derive(Clone)]
pub struct KeychainCredentials {
    keychain: Arc<dyn KeychainApi>,
    account: Option<String>,
}

impl KeychainCredentials {
    /// Creates a provider for the given member id.
    pub fn new(keychain: Arc<dyn KeychainApi>, account: Option<String>) -> Self {
        Self { keychain, account }
    }

    /// Stores the password for the credentials' member id.
    ///
    /// # Errors
    ///
    /// Returns an error if the keychain write fails.
    pub async fn store(&self, credentials: &Credentials) -> Result<(), PortalError> {
        self.keychain
            .set(services::PORTAL, credentials.id(), credentials.password())
            .await?;
        info!(account = %credentials.id(), "Stored portal password");
        Ok(())
    }

    /// Removes the stored password for a member id.
    ///
    /// # Errors
    ///
    /// Returns an error if the keychain delete fails.
    pub async fn clear(&self, account: &str) -> Result<(), PortalError> {
        self.keychain.delete(services::PORTAL, account).await?;
        info!(account = %account, "Cleared portal password");
        Ok(())
    }
}

impl std::fmt::Debug for KeychainCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainCredentials")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for KeychainCredentials {
    fn name(&self) -> &'static str {
        "keychain"
    }

    async fn credentials(&self) -> Result<Option<Credentials>, PortalError> {
        let Some(account) = &self.account else {
            return Ok(None);
        };

        match self.keychain.get(services::PORTAL, account).await? {
            Some(password) => Ok(Some(Credentials::new(account.clone(), password)?)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Tries providers in order and returns the first credentials found.
#[derive(Clone, Default)]
pub struct ChainedCredentials {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedCredentials {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredentials {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn credentials(&self) -> Result<Option<Credentials>, PortalError> {
        for provider in &self.providers {
            if let Some(credentials) = provider.credentials().await? {
                debug!(source = provider.name(), "Using credentials");
                return Ok(Some(credentials));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// Tests
// ============================================================================
