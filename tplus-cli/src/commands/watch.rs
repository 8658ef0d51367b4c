//! Watch command - periodic usage refresh.

use anyhow::Result;
use clap::Args;
use std::io::{Write, stdout};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tplus_core::UsageReport;
use tplus_portal::{CancelSignal, PortalError, UsagePipeline, cancel_pair};
use tplus_store::UsageStore;
use tracing::{info, warn};

use super::usage::{cache_report, print_report};
use crate::app::App;
use crate::output::TextFormatter;
use crate::{Cli, OutputFormat};

/// Shortest accepted interval in seconds.
const MIN_INTERVAL_SECS: u64 = 60;

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds. Defaults to the configured cadence.
    #[arg(long, short)]
    pub interval: Option<u64>,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, app: &App, cli: &Cli) -> Result<()> {
    let period = match args.interval {
        Some(secs) => Duration::from_secs(secs.max(MIN_INTERVAL_SECS)),
        None => match app.settings().await.refresh_cadence.as_duration() {
            Some(period) => period,
            None => anyhow::bail!(
                "refresh cadence is manual; pass --interval or run `tplus config set refresh_cadence 1h`"
            ),
        },
    };

    info!(interval = ?period, "Starting watch mode");

    let pipeline = app.pipeline().await?;
    let account = app.settings_store().account_id().await.unwrap_or_default();
    let formatter = TextFormatter::new(!cli.no_color);

    let (handle, signal) = cancel_pair();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    // Refreshes run one at a time; one that outlasts the period skips the
    // ticks it covered.
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = signal.cancelled() => break Ok(()),
        }

        let outcome = refresh_once(&pipeline, app.usage_store(), &account, &signal).await;
        if signal.is_cancelled() {
            break Ok(());
        }

        if cache_worthy(&outcome) {
            cache_report(app, &outcome.latest).await;
        }
        render(&outcome, &formatter, period, cli)?;

        if let Some(e) = outcome.fatal {
            warn!(error = %e, "Stopping watch mode");
            break Err(e.into());
        }
    };

    interrupt.abort();
    info!("Watch mode stopped");
    result
}

/// Result of one watch refresh.
struct RefreshOutcome {
    /// What the refresh produced.
    latest: UsageReport,
    /// What the store holds afterwards; may be an earlier report with data.
    shown: UsageReport,
    /// Set when further refreshes with the same credentials cannot succeed.
    fatal: Option<PortalError>,
}

fn cache_worthy(outcome: &RefreshOutcome) -> bool {
    outcome.latest.status.has_data()
}

/// Runs one refresh and records the result for `account`.
async fn refresh_once(
    pipeline: &UsagePipeline,
    store: &UsageStore,
    account: &str,
    signal: &CancelSignal,
) -> RefreshOutcome {
    let (latest, fatal) = match pipeline.refresh(signal).await {
        Ok(report) => (report, None),
        Err(e) => (e.degraded_report(), e.invalidates_credentials().then_some(e)),
    };
    store.set_report(account, latest.clone()).await;

    let shown = store.get_report(account).await.unwrap_or_else(|| latest.clone());
    RefreshOutcome {
        latest,
        shown,
        fatal,
    }
}

fn render(
    outcome: &RefreshOutcome,
    formatter: &TextFormatter,
    period: Duration,
    cli: &Cli,
) -> Result<()> {
    if cli.format == OutputFormat::Json {
        // One report per line.
        return print_report(&outcome.latest, cli);
    }

    print!("\x1b[2J\x1b[H");
    stdout().flush()?;

    println!("{}", formatter.format_watch_header(chrono::Local::now(), period));
    println!();
    println!("{}", formatter.format_report(&outcome.shown));
    if outcome.latest.status != outcome.shown.status {
        println!();
        println!("Last refresh: {}", outcome.latest.status);
    }
    println!();
    println!("Press Ctrl+C to exit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tplus_core::{Credentials, ReportStatus};
    use tplus_fetch::{HttpError, SessionTransport, TransportFactory, TransportResponse};
    use tplus_portal::{PortalEndpoints, SessionFetcher, StaticCredentials};

    const PAGE: &str = r#"<div class="amountUsed"><div></div>
        <div class="voice"><span class="rate">10/100</span></div></div>"#;

    struct Portal {
        accept: bool,
    }

    #[async_trait::async_trait]
    impl SessionTransport for Portal {
        async fn get(
            &self,
            url: &str,
            _query: &[(&str, &str)],
        ) -> Result<TransportResponse, HttpError> {
            if url.ends_with("loginAction.do") {
                let response = TransportResponse::new(200, "");
                return Ok(if self.accept {
                    response.with_header("Content-Language", "ko")
                } else {
                    response
                });
            }
            Ok(TransportResponse::new(200, PAGE))
        }
    }

    struct Factory {
        accept: bool,
    }

    impl TransportFactory for Factory {
        fn open(&self) -> Result<Box<dyn SessionTransport>, HttpError> {
            Ok(Box::new(Portal { accept: self.accept }))
        }
    }

    fn pipeline(accept: bool) -> UsagePipeline {
        UsagePipeline::new(
            SessionFetcher::new(PortalEndpoints::default(), Arc::new(Factory { accept })),
            Arc::new(StaticCredentials::new(Credentials::new("member", "pw").unwrap())),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_refresh_once_records_report() {
        let store = UsageStore::with_cache_path("unused.json".into());
        let outcome =
            refresh_once(&pipeline(true), &store, "member", &CancelSignal::never()).await;

        assert_eq!(outcome.latest.status, ReportStatus::Fresh);
        assert_eq!(outcome.shown.usage.voice_total, 100.0);
        assert!(cache_worthy(&outcome));
        assert!(outcome.fatal.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_data() {
        let store = UsageStore::with_cache_path("unused.json".into());
        refresh_once(&pipeline(true), &store, "member", &CancelSignal::never()).await;

        let outcome =
            refresh_once(&pipeline(false), &store, "member", &CancelSignal::never()).await;
        assert_eq!(outcome.latest.status, ReportStatus::AuthRejected);
        assert_eq!(outcome.shown.status, ReportStatus::Fresh);
        assert!(!cache_worthy(&outcome));
    }

    #[tokio::test]
    async fn test_rejected_login_stops_watch() {
        let store = UsageStore::with_cache_path("unused.json".into());
        let outcome =
            refresh_once(&pipeline(false), &store, "member", &CancelSignal::never()).await;

        let fatal = outcome.fatal.unwrap();
        assert_eq!(fatal.report_status(), ReportStatus::AuthRejected);
        let exit = crate::ExitCode::for_error(&anyhow::Error::from(fatal));
        assert_eq!(exit, crate::ExitCode::AuthRejected);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_is_not_fatal() {
        let store = UsageStore::with_cache_path("unused.json".into());
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let outcome = refresh_once(&pipeline(true), &store, "member", &signal).await;
        assert_eq!(outcome.latest.status, ReportStatus::Cancelled);
        assert!(outcome.fatal.is_none());
    }
}
