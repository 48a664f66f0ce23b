//! Error types for accessgate
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for accessgate operations
///
/// Each variant maps to one failure class of the authorization flow:
/// configuration problems surface at construction, while timeouts,
/// transport failures and parse failures surface from `authorize`.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Invalid or missing configuration field
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorization request exceeded its deadline
    #[error("Authorization timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// Underlying fetch failed (network or HTTP status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response document lacked or mangled the structured-data element
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AccessError {
    /// Returns true when this error is an authorization deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for accessgate operations
///
/// Uses `anyhow::Error` so collaborator errors pass through unaltered;
/// crate-raised failures carry an [`AccessError`] that callers can
/// recover with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
