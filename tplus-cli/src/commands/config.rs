//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use tplus_store::{SETTING_KEYS, StoreError, default_cache_dir, default_config_dir};
use tracing::info;

use crate::app::App;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set one value, e.g. `refresh_cadence 30m`. An empty value clears optional keys.
    Set {
        /// Setting key.
        key: String,
        /// New value.
        value: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, app: &App, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(app, cli).await,
        ConfigAction::Path => show_paths(app, cli),
        ConfigAction::Set { key, value } => set_value(app, key, value).await,
        ConfigAction::Reset => reset_config(app).await,
    }
}

async fn show_config(app: &App, cli: &Cli) -> Result<()> {
    let settings = app.settings().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_settings(&settings, app.settings_store().path())
            );
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(app: &App, cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let cache_dir = default_cache_dir();
    let settings_path = app.settings_store().path();
    let cache_path = app.usage_store().cache_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Cache dir:     {}", cache_dir.display());
            println!("Report cache:  {}", cache_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configDir": config_dir.display().to_string(),
                "settingsFile": settings_path.display().to_string(),
                "cacheDir": cache_dir.display().to_string(),
                "reportCache": cache_path.display().to_string(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&paths)?);
        }
    }

    Ok(())
}

async fn set_value(app: &App, key: &str, value: &str) -> Result<()> {
    let store = app.settings_store();

    if let Err(e) = store.set_value(key, value).await {
        if matches!(e, StoreError::UnknownKey(_)) {
            anyhow::bail!("{e}. Valid keys: {}", SETTING_KEYS.join(", "));
        }
        return Err(e.into());
    }
    store.save().await?;

    info!(key = %key, "Setting updated");
    println!("{key} updated");
    Ok(())
}

async fn reset_config(app: &App) -> Result<()> {
    let store = app.settings_store();
    let path = store.path();

    if path.exists() {
        tokio::fs::remove_file(path).await?;
        store.reset().await;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
