// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! tplus CLI - T plus mobile plan usage from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Log in once; the password goes to the system keychain
//! tplus login --id 01012345678
//!
//! # Show current voice, SMS, and data usage
//! tplus
//!
//! # JSON output
//! tplus usage --format json --pretty
//!
//! # Last cached report, no network
//! tplus usage --cached
//!
//! # Diagnose a saved "my page"
//! tplus usage --html mypage.html
//!
//! # Refresh on the configured cadence
//! tplus watch
//! ```

mod app;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tplus_core::ReportStatus;
use tplus_portal::PortalError;
use tplus_store::LogLevel;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, login, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// tplus CLI - T plus mobile plan usage.
#[derive(Parser)]
#[command(name = "tplus")]
#[command(about = "T plus mobile plan usage monitor")]
#[command(long_about = r#"
tplus logs in to the T plus customer portal and shows how much of your
plan's voice minutes, text messages, and mobile data you have used.

Examples:
  tplus login                # Store credentials after verifying them
  tplus                      # Current usage
  tplus --format json        # JSON output
  tplus watch                # Refresh on the configured cadence
  tplus config show          # Show settings
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Settings file to use instead of the default.
    #[arg(long, global = true, env = "TPLUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Verify credentials with the portal and store them.
    Login(login::LoginArgs),

    /// Forget stored credentials and the cached report.
    Logout,

    /// Fetch current usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Refresh usage periodically until interrupted.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// No stored credentials.
    NotLoggedIn = 2,
    /// The portal rejected the login.
    AuthRejected = 3,
    /// Timeout.
    Timeout = 4,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    pub fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<PortalError>().map(PortalError::report_status) {
            Some(ReportStatus::NotLoggedIn) => ExitCode::NotLoggedIn,
            Some(ReportStatus::AuthRejected) => ExitCode::AuthRejected,
            Some(ReportStatus::TimedOut) => ExitCode::Timeout,
            _ => ExitCode::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("tplus=debug,tplus_core=debug,tplus_fetch=debug,tplus_portal=debug,tplus_store=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "tplus={level},tplus_core={level},tplus_fetch={level},tplus_portal={level},tplus_store={level},warn"
            ))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app = match app::App::load(cli.config.clone()).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(ExitCode::Error as i32);
        }
    };

    setup_logging(cli.verbose, cli.quiet, app.settings().await.log_level);

    let result: Result<()> = match &cli.command {
        Some(Commands::Login(args)) => login::run_login(args, &app, &cli).await,
        Some(Commands::Logout) => login::run_logout(&app, &cli).await,
        Some(Commands::Usage(args)) => usage::run(args, &app, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &app, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &app, &cli).await,
        None => usage::run(&usage::UsageArgs::default(), &app, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }
}
