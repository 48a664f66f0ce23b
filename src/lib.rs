//! accessgate - Server-assisted content authorization library
//!
//! This library authorizes a reader for a document. When the document was
//! served through a proxy cache and carries a server-rendered state token,
//! authorization goes through the authorization service, which returns the
//! result together with pre-rendered, access-filtered markup for the
//! page's sections. Otherwise authorization falls back to the publisher's
//! own endpoints.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `access`: Authorization adapters, mode selection, request building,
//!   the deadline-bounded fetcher and section reconciliation
//! - `document`: Markup parsing and section replacement
//! - `config`: Configuration management and validation
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Command handlers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use accessgate::access::{
//!     AccessAdapter, Collaborators, HttpClientAdapter, PageContext, RawAccessConfig,
//!     ReqwestTransport, ServerAdapter, StaticUrlVars,
//! };
//! use accessgate::config::Config;
//! use accessgate::document::Document;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let page = Document::parse(std::fs::read_to_string("doc.html")?);
//!     let raw = RawAccessConfig::from_page(&page)?;
//!     let url_vars = Arc::new(StaticUrlVars::from_pairs([("READER_ID", "reader1")]));
//!
//!     let client = Arc::new(HttpClientAdapter::from_raw(
//!         &raw,
//!         url_vars.clone(),
//!         config.client.timeout(),
//!     )?);
//!     let adapter = ServerAdapter::new(
//!         &raw,
//!         page,
//!         PageContext::detect("https://cdn.ampproject.org/c/acme.com/doc", &config.service.proxy_hosts),
//!         Collaborators { client, url_vars, transport: Arc::new(ReqwestTransport::new()?) },
//!         &config.service,
//!     )?;
//!
//!     let result = adapter.authorize().await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use access::{AccessAdapter, HttpClientAdapter, ServerAdapter};
pub use config::Config;
pub use document::{Document, SectionId};
pub use error::{AccessError, Result};

#[cfg(test)]
pub mod test_utils;
