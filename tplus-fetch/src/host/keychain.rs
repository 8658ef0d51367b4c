//! Secure credential storage using the system keychain.
//!
//! This module provides access to the system's secure credential storage:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! [`MemoryKeychain`] is a process-local stand-in for tests and for hosts
//! without a secret service.

use std::collections::HashMap;

use async_trait::async_trait;
use keyring::Entry;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::KeychainError;

/// Service name prefix for tplus credentials.
const SERVICE_PREFIX: &str = "tplus";

// ============================================================================
// Keychain API Trait
// ============================================================================

/// API for secure credential storage.
#[async_trait]
pub trait KeychainApi: Send + Sync {
    /// Get a credential from the keychain.
    ///
    /// # Returns
    /// * `Ok(Some(secret))` - Credential found
    /// * `Ok(None)` - Credential not found
    /// * `Err(e)` - Error accessing keychain
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError>;

    /// Set a credential in the keychain.
    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError>;

    /// Delete a credential from the keychain. Deleting a missing entry is not an error.
    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError>;

    /// Check if a credential exists.
    async fn exists(&self, service: &str, account: &str) -> bool {
        matches!(self.get(service, account).await, Ok(Some(_)))
    }
}

// ============================================================================
// System Keychain Implementation
// ============================================================================

/// Default implementation using the system keychain via the `keyring` crate.
#[derive(Debug, Clone, Default)]
pub struct SystemKeychain;

impl SystemKeychain {
    /// Creates a new system keychain instance.
    pub fn new() -> Self {
        Self
    }

    /// Builds the full service name with prefix.
    fn full_service(service: &str) -> String {
        format!("{SERVICE_PREFIX}:{service}")
    }

    /// Creates a keyring entry.
    fn entry(service: &str, account: &str) -> Result<Entry, KeychainError> {
        let full_service = Self::full_service(service);
        Entry::new(&full_service, account).map_err(|e| KeychainError::Platform(e.to_string()))
    }
}

#[async_trait]
impl KeychainApi for SystemKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        debug!(service = %service, account = %account, "Getting credential from keychain");

        let entry = Self::entry(service, account)?;

        match entry.get_password() {
            Ok(secret) if secret.is_empty() => Ok(None),
            Ok(secret) => {
                debug!(service = %service, account = %account, "Credential found");
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %service, account = %account, "Credential not found");
                Ok(None)
            }
            Err(e) => {
                warn!(service = %service, account = %account, error = %e, "Failed to get credential");
                Err(e.into())
            }
        }
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
        debug!(service = %service, account = %account, "Setting credential in keychain");

        let entry = Self::entry(service, account)?;

        entry.set_password(secret).map_err(|e| {
            warn!(service = %service, account = %account, error = %e, "Failed to set credential");
            KeychainError::from(e)
        })?;

        debug!(service = %service, account = %account, "Credential stored successfully");
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
        debug!(service = %service, account = %account, "Deleting credential from keychain");

        let entry = Self::entry(service, account)?;

        match entry.delete_credential() {
            Ok(()) => {
                debug!(service = %service, account = %account, "Credential deleted");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %service, account = %account, "Credential not found (already deleted)");
                Ok(())
            }
            Err(e) => {
                warn!(service = %service, account = %account, error = %e, "Failed to delete credential");
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// In-Memory Keychain
// ============================================================================

/// Keychain that lives in process memory only.
#[derive(Debug, Default)]
pub struct MemoryKeychain {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryKeychain {
    /// Creates an empty in-memory keychain.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeychainApi for MemoryKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
        self.entries
            .write()
            .await
            .insert((service.to_string(), account.to_string()), secret.to_string());
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
        self.entries
            .write()
            .await
            .remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

/// Service names used by tplus.
pub mod services {
    /// The carrier portal login.
    pub const PORTAL: &str = "portal";
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_service_name() {
        assert_eq!(SystemKeychain::full_service("portal"), "tplus:portal");
    }

    #[tokio::test]
    async fn test_memory_keychain_roundtrip() {
        let keychain = MemoryKeychain::new();
        assert!(!keychain.exists(services::PORTAL, "member").await);

        keychain.set(services::PORTAL, "member", "secret").await.unwrap();
        assert_eq!(
            keychain.get(services::PORTAL, "member").await.unwrap().as_deref(),
            Some("secret")
        );

        keychain.delete(services::PORTAL, "member").await.unwrap();
        assert!(keychain.get(services::PORTAL, "member").await.unwrap().is_none());

        // Deleting twice is fine
        assert!(keychain.delete(services::PORTAL, "member").await.is_ok());
    }

    // Note: SystemKeychain tests require platform access and are not run here.
}
