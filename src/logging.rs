//! Logging configuration for Sage.
//!
//! Initializes the tracing subscriber for the server process. The log level
//! comes from RUST_LOG when set, otherwise the value passed in.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging.
///
/// RUST_LOG takes precedence over the configured default level.
pub fn init(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.to_string())),
        )
        .init();
}
