//! Usage command - fetch and display plan usage.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tplus_core::UsageReport;
use tplus_portal::{cancel_pair, extract_detailed};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::output::{ExtractionOutput, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Print the last cached report without contacting the portal.
    #[arg(long, conflicts_with = "html")]
    pub cached: bool,

    /// Parse a saved portal page instead of fetching one.
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, app: &App, cli: &Cli) -> Result<()> {
    if let Some(path) = &args.html {
        return run_offline(path, cli).await;
    }
    if args.cached {
        let report = app
            .usage_store()
            .load_cached()
            .await?
            .context("no cached report; run `tplus usage` first")?;
        return print_report(&report, cli);
    }

    let pipeline = app.pipeline().await?;
    let (handle, signal) = cancel_pair();

    // Ctrl+C cancels the in-flight refresh.
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    info!("Fetching usage");
    let result = pipeline.refresh(&signal).await;
    interrupt.abort();

    match result {
        Ok(report) => {
            cache_report(app, &report).await;
            print_report(&report, cli)
        }
        Err(e) => {
            if cli.format == OutputFormat::Json {
                print_report(&e.degraded_report(), cli)?;
            }
            Err(e.into())
        }
    }
}

pub(crate) async fn cache_report(app: &App, report: &UsageReport) {
    match app.usage_store().save_cached(report).await {
        Ok(saved) => debug!(saved, "Report cache updated"),
        Err(e) => warn!(error = %e, "Failed to cache report"),
    }
}

async fn run_offline(path: &Path, cli: &Cli) -> Result<()> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let extraction = extract_detailed(&html);

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            if !extraction.container_found {
                println!("No usage section found in {}", path.display());
                return Ok(());
            }
            let errors = formatter.format_extraction_errors(&extraction.errors);
            println!("{}", formatter.format_report(&extraction.into_report()));
            if !errors.is_empty() {
                println!();
                println!("{errors}");
            }
        }
        OutputFormat::Json => {
            let output = ExtractionOutput::from(&extraction);
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }
    Ok(())
}

pub(crate) fn print_report(report: &UsageReport, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_report(report));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(report)?);
        }
    }
    Ok(())
}
