// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # tplus Store
//!
//! State management for tplus.
//!
//! This crate provides:
//!
//! - **UsageStore**: Latest report per account and the on-disk last-report
//!   cache
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use tplus_store::{SettingsStore, UsageStore};
//!
//! let settings = SettingsStore::load_default().await?;
//! let usage = UsageStore::new();
//!
//! usage.set_report("01012345678", report.clone()).await;
//! usage.save_cached(&report).await?;
//! ```

pub mod error;
pub mod persistence;
pub mod settings_store;
pub mod usage_store;

pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_report_cache_path, default_settings_path,
    load_json, load_json_or_default, save_json,
};
pub use settings_store::{
    LogLevel, PortalSettings, RefreshCadence, SETTING_KEYS, Settings, SettingsStore,
};
pub use usage_store::UsageStore;
