//! Structured logging setup.
//!
//! The notifier runs unattended inside a cluster, so its logs default to
//! JSON lines on stderr. `RUST_LOG` overrides the default `info` filter.

use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::error::NotifierError;

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`NotifierError::Configuration`] when a global subscriber is
/// already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), NotifierError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    installed.map_err(|error| NotifierError::Configuration {
        message: format!("failed to install log subscriber: {error}"),
    })
}
