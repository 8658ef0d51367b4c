//! Usage page parser.
//!
//! The portal renders usage as a container with class `amountUsed`. Its first
//! child `div` is a header; every following child `div` is one category row
//! whose class list names the category (`voice`, `mms`, or `data`) and which
//! holds a `span.rate` with text like `512 / 2048`.
//!
//! Extraction never fails as a whole. A missing container yields the all-zero
//! record; a malformed row leaves its category at zero and is reported in
//! [`Extraction::errors`]. When two rows share a category the later one wins.

use scraper::{ElementRef, Html, Selector};
use tplus_core::{
    CategoryUsage, RawCategoryRow, ReportStatus, UsageCategory, UsageRecord, UsageReport,
};
use tracing::{debug, warn};

use crate::error::ParseError;

const CONTAINER_SELECTOR: &str = ".amountUsed";
const RATE_SELECTOR: &str = "span.rate";

// ============================================================================
// Extraction Result
// ============================================================================

/// Everything learned from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// The usage record; unread categories stay zero.
    pub record: UsageRecord,
    /// Whether the usage container was found.
    pub container_found: bool,
    /// Rows that were classified and had rate text, in page order.
    pub rows: Vec<RawCategoryRow>,
    /// Rows that were classified but could not be read.
    pub errors: Vec<ParseError>,
}

impl Extraction {
    /// How the page should be reported.
    ///
    /// A container whose classified rows all failed is
    /// [`ReportStatus::Unreadable`], which carries no data.
    pub fn status(&self) -> ReportStatus {
        if !self.container_found {
            return ReportStatus::NoUsageContainer;
        }
        match (self.rows.is_empty(), self.errors.is_empty()) {
            (true, true) => ReportStatus::NoUsageRows,
            (true, false) => ReportStatus::Unreadable,
            (false, false) => ReportStatus::Partial,
            (false, true) => ReportStatus::Fresh,
        }
    }

    /// Converts into a report stamped now.
    pub fn into_report(self) -> UsageReport {
        let mut report = UsageReport::from_page(self.record, self.errors.len());
        report.status = self.status();
        if !self.errors.is_empty() {
            let detail: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            report.detail = Some(detail.join("; "));
        }
        report
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Extracts the usage record from a portal page.
///
/// Total: any input, including empty or non-HTML text, yields a record.
pub fn extract(html: &str) -> UsageRecord {
    extract_detailed(html).record
}

/// Extracts the usage record along with per-row diagnostics.
pub fn extract_detailed(html: &str) -> Extraction {
    let (Ok(container_selector), Ok(rate_selector)) = (
        Selector::parse(CONTAINER_SELECTOR),
        Selector::parse(RATE_SELECTOR),
    ) else {
        warn!("Usage selectors failed to compile");
        return Extraction::default();
    };

    let document = Html::parse_document(html);
    let Some(container) = document.select(&container_selector).next() else {
        debug!(len = html.len(), "No usage container on page");
        return Extraction::default();
    };

    let mut extraction = Extraction {
        container_found: true,
        ..Extraction::default()
    };

    // Index 0 is the header row.
    for (index, row) in child_rows(container).enumerate().skip(1) {
        let Some(category) = UsageCategory::from_classes(row.value().classes()) else {
            debug!(row = index, "Skipping unclassified row");
            continue;
        };

        match read_row(index, category, row, &rate_selector) {
            Ok((raw, usage)) => {
                extraction.record = extraction.record.with(category, usage);
                extraction.rows.push(raw);
            }
            Err(e) => {
                warn!(error = %e, "Usage row skipped");
                extraction.errors.push(e);
            }
        }
    }

    debug!(
        rows = extraction.rows.len(),
        errors = extraction.errors.len(),
        "Usage page parsed"
    );
    extraction
}

// ============================================================================
// Row Parsing
// ============================================================================

fn child_rows(container: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
}

fn read_row(
    index: usize,
    category: UsageCategory,
    row: ElementRef<'_>,
    rate_selector: &Selector,
) -> Result<(RawCategoryRow, CategoryUsage), ParseError> {
    let rate = row
        .select(rate_selector)
        .next()
        .ok_or(ParseError::MissingRate { row: index, category })?;

    let text: String = rate
        .text()
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .collect();
    let (used, total) = parse_pair(index, &text)?;

    let usage = CategoryUsage::new(category.normalize(used), category.normalize(total));
    let raw = RawCategoryRow {
        index,
        category,
        text,
    };
    Ok((raw, usage))
}

/// Parses whitespace-free `used/total` text.
fn parse_pair(row: usize, text: &str) -> Result<(f64, f64), ParseError> {
    let parts: Vec<&str> = text.split('/').collect();
    let [used, total] = parts.as_slice() else {
        return Err(ParseError::MalformedPair {
            row,
            text: text.to_string(),
        });
    };

    Ok((parse_value(row, used)?, parse_value(row, total)?))
}

fn parse_value(row: usize, raw: &str) -> Result<f64, ParseError> {
    let value: f64 = raw.parse().map_err(|_| ParseError::InvalidNumber {
        row,
        value: raw.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ParseError::InvalidNumber {
            row,
            value: raw.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ParseError::NegativeValue { row, value });
    }
    Ok(value)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body><div class="amountUsed"><div class="head">Usage</div>{rows}</div></body></html>"#
        )
    }

    #[test]
    fn test_single_data_row_normalized() {
        let html = page(r#"<div class="data"><span class="rate">512 / 2048</span></div>"#);
        let record = extract(&html);

        assert_eq!(record.data_used_gb, 0.5);
        assert_eq!(record.data_total_gb, 2.0);
        assert_eq!(record.voice_used, 0.0);
        assert_eq!(record.sms_total, 0.0);
    }

    #[test]
    fn test_full_page() {
        let html = page(
            r#"<div class="voice"><span class="rate">120/300</span></div>
               <div class="mms"><span class="rate">5/100</span></div>
               <div class="data"><span class="rate">1536/10240</span></div>"#,
        );
        let extraction = extract_detailed(&html);

        assert_eq!(extraction.status(), ReportStatus::Fresh);
        assert_eq!(extraction.rows.len(), 3);
        assert_eq!(extraction.record.voice_used, 120.0);
        assert_eq!(extraction.record.voice_total, 300.0);
        assert_eq!(extraction.record.sms_used, 5.0);
        assert_eq!(extraction.record.sms_total, 100.0);
        assert_eq!(extraction.record.data_used_gb, 1.5);
        assert_eq!(extraction.record.data_total_gb, 10.0);
        assert_eq!(extraction.rows[0].text, "120/300");
        assert_eq!(extraction.rows[0].index, 1);
    }

    #[test]
    fn test_no_container_yields_zero() {
        let extraction = extract_detailed("<html><body><p>Please log in</p></body></html>");
        assert!(!extraction.container_found);
        assert!(extraction.record.is_zero());
        assert_eq!(extraction.status(), ReportStatus::NoUsageContainer);
    }

    #[test]
    fn test_garbage_input_yields_zero() {
        assert!(extract("").is_zero());
        assert!(extract("not html at all <<<>>> ///").is_zero());
    }

    #[test]
    fn test_header_only_container() {
        let extraction = extract_detailed(&page(""));
        assert!(extraction.container_found);
        assert!(extraction.record.is_zero());
        assert_eq!(extraction.status(), ReportStatus::NoUsageRows);
    }

    #[test]
    fn test_header_row_is_never_parsed() {
        let html = r#"<div class="amountUsed">
            <div class="voice"><span class="rate">999/999</span></div>
            <div class="voice"><span class="rate">1/2</span></div>
        </div>"#;
        let record = extract(html);
        assert_eq!(record.voice_used, 1.0);
        assert_eq!(record.voice_total, 2.0);
    }

    #[test]
    fn test_duplicate_category_last_wins() {
        let html = page(
            r#"<div class="voice"><span class="rate">10/100</span></div>
               <div class="voice"><span class="rate">20/200</span></div>"#,
        );
        let record = extract(&html);
        assert_eq!(record.voice_used, 20.0);
        assert_eq!(record.voice_total, 200.0);
    }

    #[test]
    fn test_malformed_row_is_isolated() {
        let html = page(
            r#"<div class="voice"><span class="rate">abc/100</span></div>
               <div class="mms"><span class="rate">3/50</span></div>
               <div class="data"><span class="rate">1024</span></div>"#,
        );
        let extraction = extract_detailed(&html);

        assert_eq!(extraction.record.voice_used, 0.0);
        assert_eq!(extraction.record.voice_total, 0.0);
        assert_eq!(extraction.record.sms_used, 3.0);
        assert_eq!(extraction.record.data_total_gb, 0.0);
        assert_eq!(extraction.errors.len(), 2);
        assert!(matches!(
            &extraction.errors[0],
            ParseError::InvalidNumber { row: 1, value } if value == "abc"
        ));
        assert!(matches!(
            &extraction.errors[1],
            ParseError::MalformedPair { row: 3, text } if text == "1024"
        ));
        assert_eq!(extraction.status(), ReportStatus::Partial);

        let report = extraction.into_report();
        assert_eq!(report.skipped_rows, 2);
        assert!(report.detail.is_some());
    }

    #[test]
    fn test_failed_duplicate_keeps_earlier_value() {
        let html = page(
            r#"<div class="voice"><span class="rate">10/100</span></div>
               <div class="voice"><span class="rate">oops</span></div>"#,
        );
        let record = extract(&html);
        assert_eq!(record.voice_used, 10.0);
    }

    #[test]
    fn test_all_rows_failing_is_unreadable() {
        let html = page(
            r#"<div class="voice"><span class="rate">10/100/</span></div>
               <div class="data"><span class="amount">512/2048</span></div>"#,
        );
        let extraction = extract_detailed(&html);
        assert!(extraction.rows.is_empty());
        assert_eq!(extraction.errors.len(), 2);
        assert_eq!(extraction.status(), ReportStatus::Unreadable);

        let report = extraction.into_report();
        assert_eq!(report.status, ReportStatus::Unreadable);
        assert!(!report.status.has_data());
        assert_eq!(report.skipped_rows, 2);
    }

    #[test]
    fn test_missing_rate_span() {
        let html = page(r#"<div class="data"><span class="amount">512/2048</span></div>"#);
        let extraction = extract_detailed(&html);
        assert!(matches!(
            extraction.errors[0],
            ParseError::MissingRate {
                row: 1,
                category: UsageCategory::Data
            }
        ));
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let html = page(
            r#"<div class="voice"><span class="rate">-5/100</span></div>
               <div class="mms"><span class="rate">NaN/10</span></div>
               <div class="data"><span class="rate">1/inf</span></div>"#,
        );
        let extraction = extract_detailed(&html);
        assert!(extraction.record.is_zero());
        assert!(matches!(extraction.errors[0], ParseError::NegativeValue { row: 1, .. }));
        assert!(matches!(extraction.errors[1], ParseError::InvalidNumber { row: 2, .. }));
        assert!(matches!(extraction.errors[2], ParseError::InvalidNumber { row: 3, .. }));
    }

    #[test]
    fn test_unclassified_rows_are_ignored() {
        let html = page(
            r#"<div class="roaming"><span class="rate">1/2</span></div>
               <div class="sms"><span class="rate">3/4</span></div>"#,
        );
        let extraction = extract_detailed(&html);
        assert!(extraction.record.is_zero());
        assert!(extraction.errors.is_empty());
        assert!(extraction.rows.is_empty());
    }

    #[test]
    fn test_whitespace_and_nested_text_stripped() {
        let html = page(
            "<div class=\"mms\"><span class=\"rate\">\n  <b>7</b>\t/ <em>1 000</em>\n</span></div>",
        );
        let extraction = extract_detailed(&html);
        assert_eq!(extraction.rows[0].text, "7/1000");
        assert_eq!(extraction.record.sms_used, 7.0);
        assert_eq!(extraction.record.sms_total, 1000.0);
    }

    #[test]
    fn test_decimal_values() {
        let html = page(r#"<div class="data"><span class="rate">256.5/1024</span></div>"#);
        let record = extract(&html);
        assert!((record.data_used_gb - 256.5 / 1024.0).abs() < f64::EPSILON);
        assert_eq!(record.data_total_gb, 1.0);
    }

    #[test]
    fn test_first_container_used() {
        let html = r#"
            <div class="amountUsed"><div>h</div><div class="voice"><span class="rate">1/2</span></div></div>
            <div class="amountUsed"><div>h</div><div class="voice"><span class="rate">8/9</span></div></div>"#;
        assert_eq!(extract(html).voice_used, 1.0);
    }

    #[test]
    fn test_only_direct_child_divs_are_rows() {
        let html = r#"<div class="amountUsed">
            <div class="head">h</div>
            <section><div class="voice"><span class="rate">5/5</span></div></section>
            <p class="mms"><span class="rate">6/6</span></p>
            <div class="data"><span class="rate">2048/4096</span></div>
        </div>"#;
        let extraction = extract_detailed(html);
        assert_eq!(extraction.record.voice_used, 0.0);
        assert_eq!(extraction.record.sms_used, 0.0);
        assert_eq!(extraction.record.data_used_gb, 2.0);
        assert_eq!(extraction.rows[0].index, 1);
    }
}
