//! CLI command implementations.

pub mod config;
pub mod login;
pub mod usage;
pub mod watch;
