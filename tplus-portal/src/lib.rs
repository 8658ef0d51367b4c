// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # tplus Portal
//!
//! Talks to the T plus carrier portal and turns its "my page" into a
//! [`UsageRecord`](tplus_core::UsageRecord).
//!
//! The crate is organised around one refresh:
//!
//! - **Endpoints**: The portal URLs and the login success marker
//! - **Session**: Two-step login then page request within one cookie session
//! - **Parser**: HTML to usage record extraction
//! - **Credentials**: Where the member id and password come from
//! - **Pipeline**: One refresh with timeout, cancellation, and a per-account
//!   in-flight guard
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tplus_fetch::FetchContext;
//! use tplus_portal::{CancelSignal, EnvCredentials, PortalEndpoints, UsagePipeline};
//!
//! let ctx = FetchContext::new();
//! let pipeline = UsagePipeline::from_context(&ctx, PortalEndpoints::default(), Arc::new(EnvCredentials::new()));
//! let report = pipeline.report(&CancelSignal::never()).await;
//! ```

pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use credentials::{
    ChainedCredentials, CredentialProvider, EnvCredentials, KeychainCredentials,
    StaticCredentials,
};
pub use endpoints::PortalEndpoints;
pub use error::{ParseError, PortalError};
pub use parser::{Extraction, extract, extract_detailed};
pub use pipeline::{CancelHandle, CancelSignal, UsagePipeline, cancel_pair};
pub use session::SessionFetcher;
