// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `tplus` Core
//!
//! Core types and models shared by every `tplus` crate.
//!
//! Nothing in here performs I/O. The crate describes:
//!
//! - What a usage reading looks like ([`UsageRecord`], [`CategoryUsage`])
//! - How portal rows are classified ([`UsageCategory`], [`RawCategoryRow`])
//! - Who is asking ([`Credentials`])
//! - What a refresh produced, including degraded outcomes
//!   ([`UsageReport`], [`ReportStatus`])

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Usage types
    CategoryUsage,
    RawCategoryRow,
    UsageCategory,
    UsageRecord,
    MB_PER_GB,
    // Credentials
    Credentials,
    // Reports
    ReportStatus,
    UsageReport,
};
