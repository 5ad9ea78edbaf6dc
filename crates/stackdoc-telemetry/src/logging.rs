//! Structured logging to stderr.
//!
//! Stdout is left to command output (templates, part lists), so every log
//! line goes to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Build the env filter from config or RUST_LOG
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// Nothing to document; the sync was skipped.
    pub const SYNC_SKIPPED: &str = "sync_skipped";

    /// The documentation version already exists remotely.
    pub const VERSION_UNCHANGED: &str = "version_unchanged";

    /// Remote documentation parts were deleted.
    pub const PARTS_DELETED: &str = "parts_deleted";

    /// Local documentation parts were created remotely.
    pub const PARTS_CREATED: &str = "parts_created";

    /// A documentation version was stamped.
    pub const VERSION_CREATED: &str = "version_created";

    /// Endpoint documentation and models were spliced into a template.
    pub const TEMPLATE_SPLICED: &str = "template_spliced";

    /// A documentation export was written to disk.
    pub const EXPORT_WRITTEN: &str = "export_written";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_sync_skipped {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SYNC_SKIPPED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_version_unchanged {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::VERSION_UNCHANGED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_parts_deleted {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::PARTS_DELETED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_parts_created {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::PARTS_CREATED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_version_created {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::VERSION_CREATED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_template_spliced {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::TEMPLATE_SPLICED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_export_written {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::EXPORT_WRITTEN,
            $($field)*
        )
    };
}
