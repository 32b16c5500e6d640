//! Fractl Mock — a scriptable in-memory adapter.
//!
//! `MockAdapter` implements the adapter contract without any wallet or
//! network behind it. Tests use it to hold connects in flight, inject
//! failures and push status changes; the `fractl` CLI uses it through
//! `DemoConfig` to run a session end to end.

pub mod adapter;
pub mod config;

pub use adapter::{random_address, MockAdapter};
pub use config::{ConfigError, DemoConfig, MockConfig};
