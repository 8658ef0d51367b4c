//! CLI output formatting tests.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::Utc;
    use std::path::Path;
    use tplus_core::{CategoryUsage, ReportStatus, UsageCategory, UsageRecord, UsageReport};
    use tplus_portal::ParseError;
    use tplus_store::Settings;

    fn report() -> UsageReport {
        let usage = UsageRecord::zero()
            .with(UsageCategory::Voice, CategoryUsage::new(152.0, 350.0))
            .with(UsageCategory::Sms, CategoryUsage::new(41.0, 300.0))
            .with(UsageCategory::Data, CategoryUsage::new(3.5, 6.0));
        UsageReport::from_page(usage, 0).for_account("01099998888")
    }

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"),
            (50.0, "█████░░░░░"),
            (100.0, "██████████"),
            (140.0, "██████████"),
            (-5.0, "░░░░░░░░░░"),
        ];

        for (percent, expected) in test_cases {
            assert_eq!(formatter.progress_bar(percent), expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.progress_bar(10.0).contains("\x1b[31m"));
        assert!(formatter.progress_bar(30.0).contains("\x1b[33m"));
        assert!(formatter.progress_bar(80.0).contains("\x1b[32m"));
    }

    #[test]
    fn test_category_line() {
        let formatter = TextFormatter::new(false);

        let voice = formatter.format_category(UsageCategory::Voice, CategoryUsage::new(152.0, 350.0));
        assert!(voice.contains("Voice"));
        assert!(voice.contains("152 / 350 min"));
        assert!(voice.contains("57% left"));

        let data = formatter.format_category(UsageCategory::Data, CategoryUsage::new(3.5, 6.0));
        assert!(data.contains("3.50 / 6.00 GB"));
    }

    #[test]
    fn test_category_without_allowance() {
        let formatter = TextFormatter::new(false);
        let line = formatter.format_category(UsageCategory::Sms, CategoryUsage::default());
        assert!(line.contains("n/a"));
        assert!(!line.contains('█'));
    }

    #[test]
    fn test_fresh_report() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_report_at(&report(), Utc::now());

        assert!(output.starts_with("T plus (01099998888)"));
        assert!(output.contains("41 / 300 msg"));
        assert!(output.contains("Updated just now"));
        assert!(!output.contains("skipped"));
    }

    #[test]
    fn test_degraded_report_shows_status_only() {
        let formatter = TextFormatter::new(false);
        let report = UsageReport::degraded(ReportStatus::AuthRejected, "Login rejected by portal");
        let output = formatter.format_report(&report);

        assert!(output.contains("login rejected by portal"));
        assert!(output.contains("Login rejected by portal"));
        assert!(!output.contains("Voice"));
    }

    #[test]
    fn test_partial_report() {
        let formatter = TextFormatter::new(false);
        let mut report = report();
        report.status = ReportStatus::Partial;
        report.skipped_rows = 1;
        report.detail = Some("row 2: expected used/total, got \"41of300\"".into());

        let output = formatter.format_report(&report);
        assert!(output.contains("Voice"));
        assert!(output.contains("1 row(s) skipped"));
        assert!(output.contains("41of300"));
    }

    #[test]
    fn test_extraction_errors() {
        let formatter = TextFormatter::new(false);
        assert!(formatter.format_extraction_errors(&[]).is_empty());

        let errors = [ParseError::MalformedPair {
            row: 2,
            text: "41of300".into(),
        }];
        let output = formatter.format_extraction_errors(&errors);
        assert!(output.starts_with("Rows skipped:"));
        assert!(output.contains("row 2"));
    }

    #[test]
    fn test_settings_listing() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_settings(&Settings::default(), Path::new("/tmp/settings.json"));

        assert!(output.contains("/tmp/settings.json"));
        assert!(output.contains("(not logged in)"));
        assert!(output.contains("1 hour"));
        assert!(output.contains("tplusmobile.com"));
        assert!(output.contains("portal.login_url"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{ExtractionOutput, JsonFormatter};
    use tplus_core::{ReportStatus, UsageReport};
    use tplus_portal::extract_detailed;

    const PAGE: &str = r#"<div class="amountUsed">
        <div class="tit"><span>Category</span></div>
        <div class="voice"><span class="rate">10 / 100</span></div>
        <div class="data"><span class="rate">1024 / oops</span></div>
    </div>"#;

    #[test]
    fn test_format_pretty_and_compact() {
        let data = serde_json::json!({"key": "value"});
        assert!(JsonFormatter::new(true).format(&data).unwrap().contains('\n'));
        assert!(!JsonFormatter::new(false).format(&data).unwrap().contains('\n'));
    }

    #[test]
    fn test_report_fields() {
        let report = UsageReport::degraded(ReportStatus::TimedOut, "slow").for_account("member");
        let output = JsonFormatter::new(false).format(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["accountId"], "member");
        assert_eq!(value["usage"]["dataUsedGB"], 0.0);
        assert!(value.get("fetchedAt").is_some());
    }

    #[test]
    fn test_extraction_output() {
        let extraction = extract_detailed(PAGE);
        let output = ExtractionOutput::from(&extraction);

        assert_eq!(output.status, ReportStatus::Partial);
        assert!(output.container_found);
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.errors.len(), 1);

        let json = JsonFormatter::new(false).format(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["containerFound"], true);
        assert_eq!(value["usage"]["voiceTotal"], 100.0);
    }
}
