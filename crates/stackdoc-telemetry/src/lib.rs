//! Logging for the stackdoc documentation compiler.
//!
//! This crate provides:
//! - Structured JSON or pretty logging through `tracing-subscriber`
//! - Standard event names and `log_*!` macros shared by the compiler and CLI
//!
//! # Usage
//!
//! ```ignore
//! use stackdoc_telemetry::{LogFormat, TelemetryConfig};
//!
//! let config = TelemetryConfig::new()
//!     .with_log_level("debug")
//!     .with_log_format(LogFormat::Pretty);
//!
//! stackdoc_telemetry::init(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::events;

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Install the global subscriber described by `config`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)
}
