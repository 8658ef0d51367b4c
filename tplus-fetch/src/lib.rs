// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # tplus Fetch
//!
//! Transport infrastructure and host APIs for talking to the carrier portal.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::http`] - Cookie-backed HTTP client with tracing and domain allowlist
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! ## Session Transport
//!
//! Portal logins are correlated by a session cookie, so every refresh opens
//! its own cookie jar:
//!
//! - [`transport::TransportFactory`] - Opens a fresh session per refresh
//! - [`transport::SessionTransport`] - Issues GET requests within one session
//! - [`context::FetchContext`] - Bundles the factory, keychain, and settings
//!
//! ## Example
//!
//! ```ignore
//! use tplus_fetch::FetchContext;
//!
//! let ctx = FetchContext::new();
//! let session = ctx.transports.open()?;
//! let response = session.get(LOGIN_URL, &[("mberId", id)]).await?;
//! ```

pub mod context;
pub mod error;
pub mod host;
pub mod transport;

// Errors
pub use error::{FetchError, FetchStep, HttpError, KeychainError};

// Host APIs
pub use host::{
    http::HttpClient,
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain},
};

// Transport & context
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use transport::{HttpTransportFactory, SessionTransport, TransportFactory, TransportResponse};
