//! Wiring from saved settings to the portal pipeline.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tplus_fetch::{FetchContext, FetchSettings, KeychainApi, SystemKeychain};
use tplus_portal::{
    ChainedCredentials, EnvCredentials, KeychainCredentials, PortalEndpoints, SessionFetcher,
    UsagePipeline,
};
use tplus_store::{PortalSettings, Settings, SettingsStore, UsageStore};
use tracing::debug;

/// Stores and host services shared by all commands.
pub struct App {
    settings: SettingsStore,
    usage: UsageStore,
    keychain: Arc<dyn KeychainApi>,
}

impl App {
    /// Loads settings from `path`, or the default location.
    pub async fn load(path: Option<PathBuf>) -> Result<Self> {
        let settings = match path {
            Some(path) => SettingsStore::load(path).await,
            None => SettingsStore::load_default().await,
        }
        .context("failed to load settings")?;

        Ok(Self {
            settings,
            usage: UsageStore::new(),
            keychain: Arc::new(SystemKeychain::new()),
        })
    }

    /// Current settings snapshot.
    pub async fn settings(&self) -> Settings {
        self.settings.get().await
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn usage_store(&self) -> &UsageStore {
        &self.usage
    }

    /// Keychain access scoped to `account`.
    pub fn keychain_credentials(&self, account: Option<String>) -> KeychainCredentials {
        KeychainCredentials::new(Arc::clone(&self.keychain), account)
    }

    /// Builds a fetch context from the current settings.
    pub async fn fetch_context(&self) -> FetchContext {
        let settings = self.settings().await;
        FetchContext::builder()
            .settings(fetch_settings(&settings))
            .keychain(Arc::clone(&self.keychain))
            .build()
    }

    /// Portal endpoints with any configured overrides applied.
    pub async fn endpoints(&self) -> Result<PortalEndpoints> {
        let endpoints = endpoints(&self.settings().await.portal);
        endpoints.validate()?;
        Ok(endpoints)
    }

    /// A fetcher for one-off logins.
    pub async fn fetcher(&self) -> Result<SessionFetcher> {
        let ctx = self.fetch_context().await;
        Ok(SessionFetcher::from_context(&ctx, self.endpoints().await?))
    }

    /// The refresh pipeline.
    ///
    /// Credentials come from `TPLUS_ID`/`TPLUS_PASSWORD` first, then the
    /// keychain entry of the logged-in member.
    pub async fn pipeline(&self) -> Result<UsagePipeline> {
        let ctx = self.fetch_context().await;
        let endpoints = self.endpoints().await?;
        let account = self.settings.account_id().await;
        debug!(logged_in = account.is_some(), timeout = ?ctx.timeout(), "Building pipeline");

        let credentials = ChainedCredentials::new()
            .with(Arc::new(EnvCredentials::new()))
            .with(Arc::new(self.keychain_credentials(account)));

        Ok(UsagePipeline::from_context(
            &ctx,
            endpoints,
            Arc::new(credentials),
        ))
    }
}

fn fetch_settings(settings: &Settings) -> FetchSettings {
    let fetch = FetchSettings::default().with_timeout(settings.timeout());
    let domain = settings.portal.allowed_domain.trim();
    if domain.is_empty() {
        fetch
    } else {
        fetch.allow_only(vec![domain.to_string()])
    }
}

fn endpoints(portal: &PortalSettings) -> PortalEndpoints {
    let mut endpoints = PortalEndpoints::default();
    if let Some(url) = &portal.login_url {
        endpoints = endpoints.with_login_url(url);
    }
    if let Some(url) = &portal.usage_url {
        endpoints = endpoints.with_usage_url(url);
    }
    if let Some(header) = &portal.success_header {
        endpoints = endpoints.with_success_header(header);
    }
    endpoints
}
