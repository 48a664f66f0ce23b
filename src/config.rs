//! Configuration management for accessgate
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::access::RawAccessConfig;
use crate::error::{AccessError, Result};

/// Main configuration structure for accessgate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Access configuration; read from the page when absent
    #[serde(default)]
    pub access: Option<RawAccessConfig>,

    /// Authorization service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Client adapter settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Authorization service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service endpoint receiving authorization requests
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Deadline for a server-assisted authorization (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Hosts whose pages count as proxied
    #[serde(default = "default_proxy_hosts")]
    pub proxy_hosts: Vec<String>,
}

fn default_service_url() -> String {
    "https://cdn.ampproject.org/af".to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_proxy_hosts() -> Vec<String> {
    vec!["cdn.ampproject.org".to_string()]
}

impl ServiceConfig {
    /// Deadline as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_ms: default_timeout_ms(),
            proxy_hosts: default_proxy_hosts(),
        }
    }
}

/// Client adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deadline for direct authorization and pingback calls (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientConfig {
    /// Deadline as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error, or a directive)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_format: bool,

    /// Also append logs to this file
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "accessgate=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

/// Upper bound for any configured timeout.
const MAX_TIMEOUT_MS: u64 = 60_000;

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AccessError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] if the YAML is malformed
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| AccessError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("ACCESSGATE_SERVICE_URL") {
            self.service.url = url;
        }

        if let Ok(timeout) = std::env::var("ACCESSGATE_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse() {
                self.service.timeout_ms = value;
            } else {
                tracing::warn!("Invalid ACCESSGATE_TIMEOUT_MS: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("ACCESSGATE_CLIENT_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse() {
                self.client.timeout_ms = value;
            } else {
                tracing::warn!("Invalid ACCESSGATE_CLIENT_TIMEOUT_MS: {}", timeout);
            }
        }

        if let Ok(level) = std::env::var("ACCESSGATE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json) = std::env::var("ACCESSGATE_JSON_LOGS") {
            self.logging.json_format = matches!(json.as_str(), "1" | "true" | "yes");
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "accessgate=debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// The access section is validated separately, when an adapter is
    /// built, since it may come from the page instead of this file.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.service.url.trim().is_empty() {
            return Err(AccessError::Config("service.url cannot be empty".to_string()).into());
        }

        if url::Url::parse(&self.service.url).is_err() {
            return Err(AccessError::Config(format!(
                "service.url is not a valid URL: {}",
                self.service.url
            ))
            .into());
        }

        for (name, value) in [
            ("service.timeout_ms", self.service.timeout_ms),
            ("client.timeout_ms", self.client.timeout_ms),
        ] {
            if value == 0 {
                return Err(
                    AccessError::Config(format!("{} must be greater than 0", name)).into(),
                );
            }
            if value > MAX_TIMEOUT_MS {
                return Err(AccessError::Config(format!(
                    "{} must be less than or equal to {}",
                    name, MAX_TIMEOUT_MS
                ))
                .into());
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(AccessError::Config("logging.level cannot be empty".to_string()).into());
        }

        Ok(())
    }
}
