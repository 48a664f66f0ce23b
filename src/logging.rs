//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file
//! output. Console logs go to STDERR so command results on STDOUT stay
//! machine readable.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the event filter for a logging configuration.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?)
}

/// Initialize logging based on configuration.
///
/// # Arguments
///
/// * `config` - Logging configuration
///
/// # Errors
///
/// Returns an error if the level directive is invalid, the log file cannot
/// be opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use accessgate::config::LoggingConfig;
/// use accessgate::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "accessgate=info".to_string(),
///     json_format: true,
///     file_path: None,
/// };
///
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config)?);

    if config.json_format {
        let console_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr);

        if let Some(file_path) = &config.file_path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;

            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(Arc::new(file));

            registry.with(console_layer).with(file_layer).try_init()?;
        } else {
            registry.with(console_layer).try_init()?;
        }
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);

        if let Some(file_path) = &config.file_path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;

            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));

            registry.with(console_layer).with(file_layer).try_init()?;
        } else {
            registry.with(console_layer).try_init()?;
        }
    }

    Ok(())
}
