//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use tplus_core::{RawCategoryRow, ReportStatus, UsageRecord};
use tplus_portal::Extraction;

// ============================================================================
// Output Types
// ============================================================================

/// Diagnostic output for a parsed page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub status: ReportStatus,
    pub container_found: bool,
    pub usage: UsageRecord,
    pub rows: Vec<RawCategoryRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl From<&Extraction> for ExtractionOutput {
    fn from(extraction: &Extraction) -> Self {
        Self {
            status: extraction.status(),
            container_found: extraction.container_found,
            usage: extraction.record,
            rows: extraction.rows.clone(),
            errors: extraction.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
