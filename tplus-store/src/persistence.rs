//! File persistence helpers.
//!
//! Handles loading and saving state to disk with owner-only permissions.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

const APP_DIR: &str = "tplus";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/tplus`
/// - Linux: `~/.config/tplus`
/// - Windows: `%APPDATA%\tplus`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Returns the default cache directory.
///
/// - macOS: `~/Library/Caches/tplus`
/// - Linux: `~/.cache/tplus`
/// - Windows: `%LOCALAPPDATA%\tplus`
pub fn default_cache_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Caches"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the path of the cached last report.
pub fn default_report_cache_path() -> PathBuf {
    default_cache_dir().join("last_report.json")
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Set permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Ensures a directory exists, creating it owner-only (0700) if missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_mode(path, 0o700).await?;
    }
    Ok(())
}

/// Saves data to a JSON file.
///
/// Creates the parent directory if needed, writes through a temp file and
/// rename, and leaves the file owner-only (0600).
///
/// # Errors
///
/// Returns an error if serialization or any file operation fails.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    set_mode(&temp_path, 0o600).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

/// Loads data from a JSON file, returning the default if missing or invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

/// Removes a file if it exists.
///
/// # Errors
///
/// Returns an error for failures other than the file being absent.
pub async fn remove_file(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        assert!(default_settings_path().ends_with("tplus/settings.json"));
        assert!(default_report_cache_path().ends_with("tplus/last_report.json"));
    }

    #[tokio::test]
    async fn test_roundtrip_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("data.json");

        save_json(&path, &serde_json::json!({"key": "value"})).await.unwrap();
        let loaded: serde_json::Value = load_json(&path).await.unwrap();
        assert_eq!(loaded["key"], "value");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_and_dir_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("private");
        let path = dir.join("settings.json");

        save_json(&path, &serde_json::json!({})).await.unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        let err = load_json::<serde_json::Value>(&path).await.unwrap_err();
        assert!(err.is_not_found());

        let value: Vec<u32> = load_json_or_default(&path).await;
        assert!(value.is_empty());
        assert!(remove_file(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let value: Vec<u32> = load_json_or_default(&path).await;
        assert!(value.is_empty());
    }
}
