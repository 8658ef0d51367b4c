//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Local, Utc};
use std::path::Path;
use std::time::Duration;
use tplus_core::{CategoryUsage, ReportStatus, UsageCategory, UsageReport};
use tplus_portal::ParseError;
use tplus_store::Settings;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';
const BAR_WIDTH: usize = 10;

/// Width of the category label column.
const LABEL_WIDTH: usize = 6;

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Reports
    // ========================================================================

    /// Formats a usage report.
    ///
    /// Reports without portal data show only the status line.
    pub fn format_report(&self, report: &UsageReport) -> String {
        self.format_report_at(report, Utc::now())
    }

    pub(crate) fn format_report_at(&self, report: &UsageReport, now: DateTime<Utc>) -> String {
        let mut lines = Vec::new();

        let title = match &report.account_id {
            Some(account) => format!("{} {}", self.bold("T plus"), self.dim(&format!("({account})"))),
            None => self.bold("T plus"),
        };
        lines.push(title);

        if report.status.has_data() {
            for (category, usage) in report.usage.categories() {
                lines.push(self.format_category(category, usage));
            }
        }

        if report.status != ReportStatus::Fresh {
            lines.push(self.format_status(report));
        }

        lines.push(self.dim(&format!(
            "Updated {}",
            format_age(report.fetched_at, now)
        )));

        lines.join("\n")
    }

    /// Formats one category line: label, remaining bar, `used / total unit`.
    pub fn format_category(&self, category: UsageCategory, usage: CategoryUsage) -> String {
        let label = format!("{:<LABEL_WIDTH$}", category.display_name());

        if usage.total <= 0.0 {
            return format!("  {}  {}", label, self.dim("n/a"));
        }

        let percent_remaining = (1.0 - usage.fraction_used()) * 100.0;
        let precision = category.display_precision();
        format!(
            "  {}  {}  {:.precision$} / {:.precision$} {}  {}",
            label,
            self.progress_bar(percent_remaining),
            usage.used,
            usage.total,
            category.unit(),
            self.dim(&format!("({percent_remaining:.0}% left)")),
        )
    }

    fn format_status(&self, report: &UsageReport) -> String {
        let mut status = report.status.description().to_string();
        if report.skipped_rows > 0 {
            status = format!("{status} ({} row(s) skipped)", report.skipped_rows);
        }
        let status = match report.status {
            ReportStatus::Partial | ReportStatus::NoUsageRows | ReportStatus::Cancelled => {
                self.yellow(&status)
            }
            _ => self.red(&status),
        };

        match &report.detail {
            Some(detail) => format!("  {status}\n  {}", self.dim(detail)),
            None => format!("  {status}"),
        }
    }

    /// Formats rows that could not be parsed.
    pub fn format_extraction_errors(&self, errors: &[ParseError]) -> String {
        if errors.is_empty() {
            return String::new();
        }
        let mut lines = vec![self.yellow("Rows skipped:")];
        lines.extend(errors.iter().map(|e| format!("  {e}")));
        lines.join("\n")
    }

    // ========================================================================
    // Watch
    // ========================================================================

    /// Header shown above each watch refresh.
    pub fn format_watch_header(&self, now: DateTime<Local>, interval: Duration) -> String {
        format!(
            "{} - {} (refresh: {})\n{}",
            self.bold("T plus watch"),
            now.format("%H:%M:%S"),
            format_interval(interval),
            "─".repeat(50)
        )
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Formats settings as `key = value` lines.
    pub fn format_settings(&self, settings: &Settings, path: &Path) -> String {
        let unset = self.dim("(default)");
        let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| unset.clone());
        let allowed_domain = if settings.portal.allowed_domain.is_empty() {
            self.dim("(any)")
        } else {
            settings.portal.allowed_domain.clone()
        };

        let rows = [
            ("account_id", settings.account_id.clone().unwrap_or_else(|| self.dim("(not logged in)"))),
            ("refresh_cadence", settings.refresh_cadence.to_string()),
            ("timeout_secs", settings.timeout_secs.to_string()),
            ("log_level", settings.log_level.to_string()),
            ("portal.login_url", optional(&settings.portal.login_url)),
            ("portal.usage_url", optional(&settings.portal.usage_url)),
            ("portal.success_header", optional(&settings.portal.success_header)),
            ("portal.allowed_domain", allowed_domain),
        ];

        let mut lines = vec![self.bold("Settings"), self.dim(&path.display().to_string())];
        lines.extend(rows.iter().map(|(key, value)| format!("  {key:<22} {value}")));
        lines.join("\n")
    }

    // ========================================================================
    // Bars & Colors
    // ========================================================================

    /// Creates a progress bar showing remaining allowance.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        let percent_remaining = percent_remaining.clamp(0.0, 100.0);
        let filled = ((percent_remaining / 100.0) * BAR_WIDTH as f64).round() as usize;
        let empty = BAR_WIDTH.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent_remaining, &bar)
    }

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

/// Relative age of a timestamp, falling back to a local date after a day.
pub(crate) fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(at);
    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{}h ago", age.num_hours())
    } else {
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
    }
}

fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}
