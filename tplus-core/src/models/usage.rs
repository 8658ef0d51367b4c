//! Usage-related types.
//!
//! This module contains types related to plan usage:
//! - [`UsageRecord`] - The six-field reading produced by one extraction
//! - [`UsageCategory`] - Voice, SMS, or data, as classified by the portal
//! - [`CategoryUsage`] - A single `used/total` pair
//! - [`RawCategoryRow`] - A parse-time row before numeric conversion

use serde::{Deserialize, Serialize};
use std::fmt;

/// Megabytes per gigabyte, as the portal reports data in megabytes.
pub const MB_PER_GB: f64 = 1024.0;

// ============================================================================
// Usage Category
// ============================================================================

/// A usage category shown on the portal's "my page".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCategory {
    /// Voice call minutes.
    Voice,
    /// Text messages. The portal labels these rows `mms`.
    Sms,
    /// Mobile data.
    Data,
}

impl UsageCategory {
    /// All categories in display order.
    pub const ALL: [UsageCategory; 3] = [Self::Voice, Self::Sms, Self::Data];

    /// The CSS class the portal puts on rows of this category.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Sms => "mms",
            Self::Data => "data",
        }
    }

    /// Classifies a row from its class list.
    ///
    /// Checks voice, then SMS, then data; the first match wins.
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let classes: Vec<&str> = classes.into_iter().collect();
        Self::ALL
            .into_iter()
            .find(|category| classes.contains(&category.css_class()))
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Voice => "Voice",
            Self::Sms => "SMS",
            Self::Data => "Data",
        }
    }

    /// Unit of the normalized values.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Voice => "min",
            Self::Sms => "msg",
            Self::Data => "GB",
        }
    }

    /// Number of decimals worth showing for this category.
    pub fn display_precision(&self) -> usize {
        match self {
            Self::Voice | Self::Sms => 0,
            Self::Data => 2,
        }
    }

    /// Converts a raw portal value into this category's unit.
    ///
    /// Data is reported in megabytes and normalized to gigabytes; the other
    /// categories pass through unchanged.
    pub fn normalize(&self, raw: f64) -> f64 {
        match self {
            Self::Data => raw / MB_PER_GB,
            Self::Voice | Self::Sms => raw,
        }
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Category Usage
// ============================================================================

/// A `used/total` pair for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUsage {
    /// Amount consumed.
    pub used: f64,
    /// Plan allowance.
    pub total: f64,
}

impl CategoryUsage {
    /// Creates a new pair.
    pub fn new(used: f64, total: f64) -> Self {
        Self { used, total }
    }

    /// Fraction of the allowance consumed, clamped to `[0, 1]`.
    ///
    /// Returns 0 when the allowance is zero.
    pub fn fraction_used(&self) -> f64 {
        if self.total > 0.0 {
            (self.used / self.total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Amount left, never negative.
    pub fn remaining(&self) -> f64 {
        (self.total - self.used).max(0.0)
    }

    /// Returns true if both values are zero.
    pub fn is_zero(&self) -> bool {
        self.used == 0.0 && self.total == 0.0
    }
}

// ============================================================================
// Usage Record
// ============================================================================

/// Plan usage as read from the portal.
///
/// All fields default to zero. Data values are in gigabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Voice minutes used.
    pub voice_used: f64,
    /// Voice minutes included in the plan.
    pub voice_total: f64,
    /// Messages sent.
    pub sms_used: f64,
    /// Messages included in the plan.
    pub sms_total: f64,
    /// Data used, in GB.
    #[serde(rename = "dataUsedGB")]
    pub data_used_gb: f64,
    /// Data included in the plan, in GB.
    #[serde(rename = "dataTotalGB")]
    pub data_total_gb: f64,
}

impl UsageRecord {
    /// Creates the all-zero record.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the pair for a category.
    pub fn get(&self, category: UsageCategory) -> CategoryUsage {
        match category {
            UsageCategory::Voice => CategoryUsage::new(self.voice_used, self.voice_total),
            UsageCategory::Sms => CategoryUsage::new(self.sms_used, self.sms_total),
            UsageCategory::Data => CategoryUsage::new(self.data_used_gb, self.data_total_gb),
        }
    }

    /// Returns a copy with one category replaced.
    ///
    /// Values must already be normalized (see [`UsageCategory::normalize`]).
    #[must_use]
    pub fn with(mut self, category: UsageCategory, usage: CategoryUsage) -> Self {
        match category {
            UsageCategory::Voice => {
                self.voice_used = usage.used;
                self.voice_total = usage.total;
            }
            UsageCategory::Sms => {
                self.sms_used = usage.used;
                self.sms_total = usage.total;
            }
            UsageCategory::Data => {
                self.data_used_gb = usage.used;
                self.data_total_gb = usage.total;
            }
        }
        self
    }

    /// Iterates categories with their pairs, in display order.
    pub fn categories(&self) -> impl Iterator<Item = (UsageCategory, CategoryUsage)> + '_ {
        UsageCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Returns true if every field is zero.
    pub fn is_zero(&self) -> bool {
        self.categories().all(|(_, usage)| usage.is_zero())
    }
}

// ============================================================================
// Raw Category Row
// ============================================================================

/// A classified portal row before its numbers are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCategoryRow {
    /// Position among the container's rows; the header row is 0.
    pub index: usize,
    /// Category the row was classified as.
    pub category: UsageCategory,
    /// Rate text with all whitespace removed, e.g. `512/2048`.
    pub text: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_class_list() {
        assert_eq!(
            UsageCategory::from_classes(["row", "voice"]),
            Some(UsageCategory::Voice)
        );
        assert_eq!(UsageCategory::from_classes(["mms"]), Some(UsageCategory::Sms));
        assert_eq!(UsageCategory::from_classes(["data"]), Some(UsageCategory::Data));
        assert_eq!(UsageCategory::from_classes(["sms"]), None);
        assert_eq!(UsageCategory::from_classes(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_classify_prefers_voice_over_data() {
        assert_eq!(
            UsageCategory::from_classes(["data", "voice"]),
            Some(UsageCategory::Voice)
        );
    }

    #[test]
    fn test_normalize_data_to_gigabytes() {
        assert_eq!(UsageCategory::Data.normalize(512.0), 0.5);
        assert_eq!(UsageCategory::Voice.normalize(512.0), 512.0);
        assert_eq!(UsageCategory::Sms.normalize(3.0), 3.0);
    }

    #[test]
    fn test_record_defaults_to_zero() {
        let record = UsageRecord::zero();
        assert!(record.is_zero());
    }

    #[test]
    fn test_with_replaces_category() {
        let record = UsageRecord::zero()
            .with(UsageCategory::Voice, CategoryUsage::new(10.0, 100.0))
            .with(UsageCategory::Voice, CategoryUsage::new(20.0, 200.0));
        assert_eq!(record.voice_used, 20.0);
        assert_eq!(record.voice_total, 200.0);
        assert_eq!(record.sms_total, 0.0);
        assert!(!record.is_zero());
    }

    #[test]
    fn test_overuse_is_clamped() {
        let record =
            UsageRecord::zero().with(UsageCategory::Data, CategoryUsage::new(12.0, 10.0));
        assert_eq!(record.get(UsageCategory::Data).fraction_used(), 1.0);
        assert_eq!(record.get(UsageCategory::Data).remaining(), 0.0);
    }

    #[test]
    fn test_fraction_with_zero_total() {
        assert_eq!(CategoryUsage::new(5.0, 0.0).fraction_used(), 0.0);
        assert_eq!(CategoryUsage::new(25.0, 100.0).fraction_used(), 0.25);
    }

    #[test]
    fn test_serde_field_names() {
        let record = UsageRecord {
            voice_used: 1.0,
            voice_total: 2.0,
            sms_used: 3.0,
            sms_total: 4.0,
            data_used_gb: 0.5,
            data_total_gb: 2.0,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["voiceUsed"], 1.0);
        assert_eq!(json["smsTotal"], 4.0);
        assert_eq!(json["dataUsedGB"], 0.5);
        assert_eq!(json["dataTotalGB"], 2.0);
    }
}
