//! Command-line interface definition for accessgate
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to authorize a saved page, send a pingback, and
//! inspect how a page would be handled.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::access::OriginKind;

/// accessgate - Server-assisted content authorization
///
/// Authorizes a reader for a page, swapping in pre-rendered sections
/// from the authorization service when the page was served through a
/// proxy, and falling back to the publisher endpoints otherwise.
#[derive(Parser, Debug, Clone)]
#[command(name = "accessgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults to `config/config.yaml`)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for accessgate
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Authorize the reader for a page and apply the result
    Authorize {
        /// Path to the saved page (HTML)
        #[arg(short, long)]
        page: PathBuf,

        /// URL the page was loaded from
        #[arg(short, long)]
        url: String,

        /// How the page was served; `auto` detects it from the URL host
        #[arg(long, value_enum, default_value_t = OriginArg::Auto)]
        origin: OriginArg,

        /// URL variable as NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Write the updated page here instead of STDOUT
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report a view through the pingback endpoint
    Pingback {
        /// Path to the saved page (HTML)
        #[arg(short, long)]
        page: PathBuf,

        /// URL the page was loaded from
        #[arg(short, long)]
        url: String,

        /// URL variable as NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Show the resolved access configuration for a page
    Inspect {
        /// Path to the saved page (HTML)
        #[arg(short, long)]
        page: PathBuf,

        /// URL the page was loaded from, used for origin detection
        #[arg(short, long)]
        url: Option<String>,
    },
}

/// Origin selection on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginArg {
    /// Detect from the page URL host
    Auto,
    /// Served through a proxy cache
    Proxied,
    /// Served by the publisher
    Direct,
}

impl OriginArg {
    /// Explicit origin, or `None` when it should be detected
    pub fn as_origin(self) -> Option<OriginKind> {
        match self {
            Self::Auto => None,
            Self::Proxied => Some(OriginKind::Proxied),
            Self::Direct => Some(OriginKind::Direct),
        }
    }
}

/// Parse a `NAME=VALUE` pair. The value may itself contain `=`.
fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid variable `{}`: expected NAME=VALUE", s))?;
    if name.is_empty() {
        return Err(format!("invalid variable `{}`: name is empty", s));
    }
    Ok((name.to_string(), value.to_string()))
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Inspect {
                page: PathBuf::from("index.html"),
                url: None,
            },
        }
    }
}
