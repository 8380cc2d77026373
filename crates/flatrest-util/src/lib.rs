//! Shared utilities for flatrest.
//!
//! Currently this is the logging setup shared by the binary and the tests:
//! log level parsing and `tracing-subscriber` initialisation.

pub mod log;

pub use log::{LogConfig, LogLevel};
