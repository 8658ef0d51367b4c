//! User preferences store.
//!
//! Manages user settings with persistence and change notification.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Default refresh deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest accepted refresh deadline in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Default domain the portal session may contact.
pub const DEFAULT_ALLOWED_DOMAIN: &str = "tplusmobile.com";

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Member id of the last successful login. The password is in the keychain.
    pub account_id: Option<String>,

    /// Auto-refresh cadence for `watch`.
    pub refresh_cadence: RefreshCadence,

    /// Deadline for one refresh, in seconds.
    pub timeout_secs: u64,

    /// Log level when neither `--verbose` nor `RUST_LOG` is given.
    pub log_level: LogLevel,

    /// Portal endpoint overrides.
    pub portal: PortalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account_id: None,
            refresh_cadence: RefreshCadence::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: LogLevel::default(),
            portal: PortalSettings::default(),
        }
    }
}

/// Portal endpoint overrides. Unset fields use the built-in portal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    /// Login action URL.
    pub login_url: Option<String>,
    /// Usage page URL.
    pub usage_url: Option<String>,
    /// Header marking a successful login.
    pub success_header: Option<String>,
    /// Domain sessions may contact. Empty disables the allowlist.
    pub allowed_domain: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            login_url: None,
            usage_url: None,
            success_header: None,
            allowed_domain: DEFAULT_ALLOWED_DOMAIN.to_string(),
        }
    }
}

/// Keys accepted by [`Settings::set_value`].
pub const SETTING_KEYS: &[&str] = &[
    "account_id",
    "refresh_cadence",
    "timeout_secs",
    "log_level",
    "portal.login_url",
    "portal.usage_url",
    "portal.success_header",
    "portal.allowed_domain",
];

impl Settings {
    /// The refresh deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks value ranges and URL syntax.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "timeout_secs",
                format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
            ));
        }

        for (key, value) in [
            ("portal.login_url", &self.portal.login_url),
            ("portal.usage_url", &self.portal.usage_url),
        ] {
            if let Some(raw) = value {
                let url = Url::parse(raw).map_err(|e| invalid(key, e.to_string()))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(invalid(key, format!("unsupported scheme {}", url.scheme())));
                }
            }
        }

        if matches!(&self.portal.success_header, Some(h) if h.trim().is_empty()) {
            return Err(invalid("portal.success_header", "must not be blank".to_string()));
        }

        Ok(())
    }

    /// Sets one value by dotted key, parsing it from text.
    ///
    /// For optional values, an empty string clears the value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownKey` or `StoreError::InvalidValue`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());

        match key {
            "account_id" => self.account_id = optional(),
            "refresh_cadence" => self.refresh_cadence = parse(key, value)?,
            "timeout_secs" => {
                self.timeout_secs = value
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(key, e.to_string()))?;
            }
            "log_level" => self.log_level = parse(key, value)?,
            "portal.login_url" => self.portal.login_url = optional(),
            "portal.usage_url" => self.portal.usage_url = optional(),
            "portal.success_header" => self.portal.success_header = optional(),
            "portal.allowed_domain" => self.portal.allowed_domain = value.to_string(),
            _ => return Err(StoreError::UnknownKey(key.to_string())),
        }

        self.validate()
    }
}

fn invalid(key: &str, message: String) -> StoreError {
    StoreError::InvalidValue {
        key: key.to_string(),
        message,
    }
}

fn parse<T: FromStr<Err = String>>(key: &str, value: &str) -> Result<T, StoreError> {
    value.parse().map_err(|message| invalid(key, message))
}

/// Refresh cadence options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshCadence {
    /// Manual refresh only.
    Manual,
    /// Every fifteen minutes.
    FifteenMinutes,
    /// Every thirty minutes.
    ThirtyMinutes,
    /// Every hour.
    #[default]
    Hourly,
    /// Every three hours.
    ThreeHours,
    /// Every six hours.
    SixHours,
}

impl RefreshCadence {
    /// Returns the duration, or None for manual.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            RefreshCadence::Manual => None,
            RefreshCadence::FifteenMinutes => Some(Duration::from_secs(15 * 60)),
            RefreshCadence::ThirtyMinutes => Some(Duration::from_secs(30 * 60)),
            RefreshCadence::Hourly => Some(Duration::from_secs(60 * 60)),
            RefreshCadence::ThreeHours => Some(Duration::from_secs(3 * 60 * 60)),
            RefreshCadence::SixHours => Some(Duration::from_secs(6 * 60 * 60)),
        }
    }

    /// All available cadences.
    pub fn all() -> &'static [RefreshCadence] {
        &[
            RefreshCadence::Manual,
            RefreshCadence::FifteenMinutes,
            RefreshCadence::ThirtyMinutes,
            RefreshCadence::Hourly,
            RefreshCadence::ThreeHours,
            RefreshCadence::SixHours,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            RefreshCadence::Manual => "manual",
            RefreshCadence::FifteenMinutes => "fifteen_minutes",
            RefreshCadence::ThirtyMinutes => "thirty_minutes",
            RefreshCadence::Hourly => "hourly",
            RefreshCadence::ThreeHours => "three_hours",
            RefreshCadence::SixHours => "six_hours",
        }
    }
}

impl std::fmt::Display for RefreshCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshCadence::Manual => write!(f, "Manual"),
            RefreshCadence::FifteenMinutes => write!(f, "15 minutes"),
            RefreshCadence::ThirtyMinutes => write!(f, "30 minutes"),
            RefreshCadence::Hourly => write!(f, "1 hour"),
            RefreshCadence::ThreeHours => write!(f, "3 hours"),
            RefreshCadence::SixHours => write!(f, "6 hours"),
        }
    }
}

impl FromStr for RefreshCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let cadence = match normalized.as_str() {
            "15m" => Some(RefreshCadence::FifteenMinutes),
            "30m" => Some(RefreshCadence::ThirtyMinutes),
            "1h" => Some(RefreshCadence::Hourly),
            "3h" => Some(RefreshCadence::ThreeHours),
            "6h" => Some(RefreshCadence::SixHours),
            other => Self::all().iter().copied().find(|c| c.key() == other),
        };

        cadence.ok_or_else(|| {
            let names: Vec<&str> = Self::all().iter().map(|c| c.key()).collect();
            format!("expected one of {}", names.join(", "))
        })
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level {other:?}")),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings that saves to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing file yields defaults. An unreadable or invalid file is
    /// logged and replaced by defaults in memory; it is only overwritten on
    /// the next save.
    ///
    /// # Errors
    ///
    /// Does not fail today; callers handle `Result` for stricter loaders.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            match load_json::<Settings>(&path).await {
                Ok(settings) => match settings.validate() {
                    Ok(()) => settings,
                    Err(e) => {
                        warn!(error = %e, "Settings failed validation, using defaults");
                        Settings::default()
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Failed to load settings, using defaults");
                    Settings::default()
                }
            }
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self::with_settings(path, settings))
    }

    /// The file this store saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in memory.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Sets one value by key; see [`Settings::set_value`].
    ///
    /// The in-memory settings are unchanged if the value is rejected.
    ///
    /// # Errors
    ///
    /// Returns the validation error.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut settings = self.settings.write().await;
        let mut candidate = settings.clone();
        candidate.set_value(key, value)?;
        *settings = candidate;
        Ok(())
    }

    /// Restores defaults in memory.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// The logged-in member id.
    pub async fn account_id(&self) -> Option<String> {
        self.settings.read().await.account_id.clone()
    }

    /// Records or clears the logged-in member id.
    pub async fn set_account_id(&self, account_id: Option<String>) {
        self.update(|s| s.account_id = account_id).await;
    }

    /// Gets the refresh cadence.
    pub async fn refresh_cadence(&self) -> RefreshCadence {
        self.settings.read().await.refresh_cadence
    }

    /// Sets the refresh cadence.
    pub async fn set_refresh_cadence(&self, cadence: RefreshCadence) {
        self.update(|s| s.refresh_cadence = cadence).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
