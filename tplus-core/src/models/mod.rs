//! Domain models for `tplus`.
//!
//! ## Submodules
//!
//! - [`usage`] - Usage readings and category classification
//! - [`credentials`] - Portal member credentials
//! - [`report`] - Refresh outcomes with explicit degradation status

mod credentials;
mod report;
mod usage;

pub use credentials::Credentials;
pub use report::{ReportStatus, UsageReport};
pub use usage::{CategoryUsage, RawCategoryRow, UsageCategory, UsageRecord, MB_PER_GB};
