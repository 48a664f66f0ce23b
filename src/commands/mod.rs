/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `authorize`: Authorize the reader and apply the result to the page
- `pingback`: Report a view to the pingback endpoint
- `inspect`: Show how a page would be handled

The handlers share the page loading and adapter construction helpers
defined here.
*/

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;

use crate::access::server::SharedDocument;
use crate::access::{
    AccessAdapter, AccessType, Collaborators, HttpClientAdapter, OriginKind, PageContext,
    RawAccessConfig, ReqwestTransport, ServerAdapter, StaticUrlVars, UrlVarsCollector,
};
use crate::config::Config;
use crate::document::Document;
use crate::error::Result;

/// An adapter together with the live page it operates on.
pub struct AdapterHandle {
    /// Adapter selected by the access type
    pub adapter: Arc<dyn AccessAdapter>,
    /// The live page; updated in place by server-assisted authorization
    pub page: SharedDocument,
}

/// Read and parse a saved page
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_page(path: &Path) -> Result<Document> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page {}", path.display()))?;
    Ok(Document::parse(html))
}

/// Access configuration for a page
///
/// The config file's `access` section wins; otherwise the configuration
/// embedded in the page is used.
///
/// # Errors
///
/// Returns [`crate::error::AccessError::Config`] if neither source
/// provides a configuration.
pub fn access_config(config: &Config, page: &Document) -> Result<RawAccessConfig> {
    match &config.access {
        Some(raw) => {
            tracing::debug!("Using access configuration from config file");
            Ok(raw.clone())
        }
        None => {
            tracing::debug!("Using access configuration embedded in page");
            RawAccessConfig::from_page(page)
        }
    }
}

/// Page context for `url`, with an explicit origin or one detected from
/// the configured proxy hosts
pub fn page_context(config: &Config, url: &str, origin: Option<OriginKind>) -> PageContext {
    match origin {
        Some(origin) => PageContext::new(url, origin),
        None => PageContext::detect(url, &config.service.proxy_hosts),
    }
}

/// Create the adapter for the configured access type
///
/// `client` builds a plain [`HttpClientAdapter`]; `server` wraps one in a
/// [`ServerAdapter`] talking to the configured authorization service.
///
/// # Errors
///
/// Returns [`crate::error::AccessError::Config`] if `raw` is invalid.
pub fn create_adapter(
    config: &Config,
    raw: &RawAccessConfig,
    page: Document,
    context: PageContext,
    url_vars: Arc<dyn UrlVarsCollector>,
) -> Result<AdapterHandle> {
    let client = Arc::new(HttpClientAdapter::from_raw(
        raw,
        Arc::clone(&url_vars),
        config.client.timeout(),
    )?);

    match raw.access_type {
        AccessType::Client => {
            tracing::debug!("Creating client access adapter");
            Ok(AdapterHandle {
                adapter: client,
                page: Arc::new(RwLock::new(page)),
            })
        }
        AccessType::Server => {
            tracing::debug!("Creating server access adapter for {}", config.service.url);
            let collaborators = Collaborators {
                client,
                url_vars,
                transport: Arc::new(ReqwestTransport::new()?),
            };
            let adapter = ServerAdapter::new(raw, page, context, collaborators, &config.service)?;
            let page = adapter.page();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                page,
            })
        }
    }
}

// Authorize command handler
pub mod authorize {
    //! Authorization handler.
    //!
    //! Runs the selected adapter once, prints the authorization result as
    //! JSON and writes the (possibly updated) page.

    use super::*;
    use std::path::PathBuf;

    /// Authorize the reader for a saved page
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `page_path` - Saved page to authorize
    /// * `url` - URL the page was loaded from
    /// * `origin` - Explicit origin, or `None` to detect it
    /// * `vars` - URL variables as name/value pairs
    /// * `output` - Where to write the page; STDOUT when `None`
    ///
    /// # Errors
    ///
    /// Returns configuration, transport, timeout and parse failures
    /// unchanged.
    pub async fn run_authorize(
        config: Config,
        page_path: PathBuf,
        url: String,
        origin: Option<OriginKind>,
        vars: Vec<(String, String)>,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let page = load_page(&page_path)?;
        let raw = access_config(&config, &page)?;
        let context = page_context(&config, &url, origin);
        let url_vars = Arc::new(StaticUrlVars::from_pairs(vars));

        let handle = create_adapter(&config, &raw, page, context, url_vars)?;
        if !handle.adapter.is_authorization_enabled() {
            tracing::warn!("Authorization is disabled for this page");
            return Ok(());
        }

        let result = handle.adapter.authorize().await?;
        println!("{}", serde_json::to_string_pretty(&result)?);

        let html = handle.page.read().await.html().to_string();
        match output {
            Some(path) => {
                std::fs::write(&path, html)
                    .with_context(|| format!("Failed to write page {}", path.display()))?;
                tracing::info!("Wrote updated page to {}", path.display());
            }
            None => println!("{}", html),
        }

        Ok(())
    }
}

// Pingback command handler
pub mod pingback {
    //! Pingback handler.

    use super::*;
    use std::path::PathBuf;

    /// Send a pingback for a saved page
    ///
    /// # Errors
    ///
    /// Returns configuration and transport failures unchanged.
    pub async fn run_pingback(
        config: Config,
        page_path: PathBuf,
        url: String,
        vars: Vec<(String, String)>,
    ) -> Result<()> {
        let page = load_page(&page_path)?;
        let raw = access_config(&config, &page)?;
        let context = page_context(&config, &url, None);
        let url_vars = Arc::new(StaticUrlVars::from_pairs(vars));

        let handle = create_adapter(&config, &raw, page, context, url_vars)?;
        if !handle.adapter.is_pingback_enabled() {
            tracing::warn!("Pingback is disabled for this page");
            return Ok(());
        }

        handle.adapter.pingback().await?;
        tracing::info!("Pingback sent");
        Ok(())
    }
}

// Inspect command handler
pub mod inspect {
    //! Inspection handler.
    //!
    //! Prints what an authorize run would do without contacting any
    //! endpoint.

    use super::*;
    use crate::access::resolver::resolve;
    use crate::access::{select_mode, AccessMode};
    use serde_json::json;
    use std::path::PathBuf;

    /// Build the inspection report for a page
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AccessError::Config`] if the access
    /// configuration is missing or invalid.
    pub fn inspect_page(
        config: &Config,
        page: &Document,
        url: Option<&str>,
    ) -> Result<serde_json::Value> {
        let raw = access_config(config, page)?;
        let resolved = resolve(&raw, page)?;

        let origin = url.map(|u| OriginKind::detect(u, &config.service.proxy_hosts));
        let mode = match (raw.access_type, origin) {
            (AccessType::Server, Some(origin)) => Some(select_mode(origin, &resolved.state)),
            (AccessType::Server, None) => None,
            (AccessType::Client, _) => Some(AccessMode::ClientFallback),
        };

        Ok(json!({
            "type": raw.access_type,
            "authorization": resolved.config.authorization_url,
            "pingback": resolved.config.pingback_url,
            "state": resolved.state,
            "origin": origin,
            "mode": mode,
            "sections": page.section_ids(),
        }))
    }

    /// Print the inspection report for a saved page
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be read or its access
    /// configuration is invalid.
    pub fn run_inspect(config: Config, page_path: PathBuf, url: Option<String>) -> Result<()> {
        let page = load_page(&page_path)?;
        let report = inspect_page(&config, &page, url.as_deref())?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
