//! # Logging Infrastructure
//!
//! Structured logs for the sync client, written to `logs/tiertreff.log`
//! with daily rotation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use client::debug;
//!
//! // Keep the guard until shutdown so buffered lines get flushed.
//! let _guard = debug::init();
//!
//! tracing::info!(channel = "presence", "Broker connected");
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `client=debug,info`)
//! - `TIERTREFF_LOG_DIR`: Log directory (default: `logs`)
//! - `TIERTREFF_LOG_JSON`: JSON lines instead of text (1=on)
//! - `TIERTREFF_LOG_CONSOLE`: Mirror logs to stderr (1=on)

pub mod config;
pub mod logger;

pub use config::DebugConfig;
pub use logger::init as init_logger;

use tracing_appender::non_blocking::WorkerGuard;

/// Initialize logging from the environment. Call this at startup, before
/// any other operations.
pub fn init() -> Option<WorkerGuard> {
    init_logger(&DebugConfig::from_env())
}
