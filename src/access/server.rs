//! Server-assisted authorization adapter
//!
//! [`ServerAdapter`] wraps a client adapter. When the page was served
//! through a proxy and carries a server-rendered state token, it asks the
//! authorization service for the result and the access-filtered section
//! markup, swaps that markup into the live page, and returns the result.
//! Otherwise it hands authorization to the client adapter untouched.
//!
//! ```text
//! authorize ─► select mode ─┬─► ClientFallback ─► client.authorize()
//!                           └─► ServerAssisted ─► build request
//!                                                ─► fetch (deadline)
//!                                                ─► extract result
//!                                                ─► replace sections ─► result
//! ```
//!
//! Pingback always goes to the client adapter; there is exactly one
//! pingback path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::access::fetcher::{DocumentTransport, TimedFetcher};
use crate::access::mode::{select_mode, AccessMode, OriginKind};
use crate::access::request::RequestBuilder;
use crate::access::resolver::{resolve, AccessConfiguration, RawAccessConfig, ServerState};
use crate::access::response::extract_result;
use crate::access::sections::SectionReplacer;
use crate::access::vars::UrlVarsCollector;
use crate::access::{AccessAdapter, AuthorizationResult};
use crate::config::ServiceConfig;
use crate::document::Document;
use crate::error::Result;

/// Live page shared between the adapter and its owner.
pub type SharedDocument = Arc<RwLock<Document>>;

/// Facts about the current page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Current page URL, possibly with a fragment
    pub url: String,
    /// How the page was served
    pub origin: OriginKind,
}

impl PageContext {
    /// Create a context with an explicit origin
    pub fn new(url: impl Into<String>, origin: OriginKind) -> Self {
        Self {
            url: url.into(),
            origin,
        }
    }

    /// Create a context, detecting the origin from the URL host
    pub fn detect(url: impl Into<String>, proxy_hosts: &[String]) -> Self {
        let url = url.into();
        let origin = OriginKind::detect(&url, proxy_hosts);
        Self { url, origin }
    }
}

/// External collaborators of a [`ServerAdapter`].
#[derive(Clone)]
pub struct Collaborators {
    /// Client adapter used for fallback and pingback
    pub client: Arc<dyn AccessAdapter>,
    /// URL variable source
    pub url_vars: Arc<dyn UrlVarsCollector>,
    /// Network transport for the authorization service
    pub transport: Arc<dyn DocumentTransport>,
}

/// Server-assisted authorization adapter with client fallback.
pub struct ServerAdapter {
    config: AccessConfiguration,
    state: ServerState,
    context: PageContext,
    page: SharedDocument,
    client: Arc<dyn AccessAdapter>,
    request_builder: RequestBuilder,
    fetcher: TimedFetcher,
    replacer: SectionReplacer,
    service_url: String,
    sections_replaced: AtomicUsize,
}

impl ServerAdapter {
    /// Build an adapter for one page load
    ///
    /// Validates `raw` and reads the server state from `page` once; both
    /// stay fixed for the adapter's lifetime.
    ///
    /// # Arguments
    ///
    /// * `raw` - Access configuration as written by the publisher
    /// * `page` - The live page; the adapter takes ownership and shares it
    ///   through [`ServerAdapter::page`]
    /// * `context` - Page URL and origin
    /// * `collaborators` - Client adapter, URL variable source, transport
    /// * `service` - Authorization service URL and deadline
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AccessError::Config`] if `raw` is invalid.
    pub fn new(
        raw: &RawAccessConfig,
        page: Document,
        context: PageContext,
        collaborators: Collaborators,
        service: &ServiceConfig,
    ) -> Result<Self> {
        let resolved = resolve(raw, &page)?;
        tracing::info!(
            "Initialized server access adapter: origin={:?}, server_state={}",
            context.origin,
            resolved.state.is_available()
        );

        Ok(Self {
            config: resolved.config,
            state: resolved.state,
            context,
            page: Arc::new(RwLock::new(page)),
            client: collaborators.client,
            request_builder: RequestBuilder::new(collaborators.url_vars),
            fetcher: TimedFetcher::new(collaborators.transport, service.timeout()),
            replacer: SectionReplacer::new(),
            service_url: service.url.clone(),
            sections_replaced: AtomicUsize::new(0),
        })
    }

    /// Validated access configuration
    pub fn config(&self) -> &AccessConfiguration {
        &self.config
    }

    /// Server state captured at construction
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Page context
    pub fn context(&self) -> &PageContext {
        &self.context
    }

    /// Mode the next authorize call will use
    pub fn mode(&self) -> AccessMode {
        select_mode(self.context.origin, &self.state)
    }

    /// Handle to the live page
    pub fn page(&self) -> SharedDocument {
        Arc::clone(&self.page)
    }

    /// Total live sections replaced by server-assisted authorizations
    pub fn sections_replaced(&self) -> usize {
        self.sections_replaced.load(Ordering::SeqCst)
    }

    async fn authorize_on_server(&self) -> Result<AuthorizationResult> {
        let request = self
            .request_builder
            .build(&self.client.authorization_url(), &self.context.url, &self.state)
            .await?;
        tracing::debug!("Authorization request built for {}", request.url);

        let response = self.fetcher.fetch(&self.service_url, &request).await?;
        tracing::debug!("Authorization response received from {}", self.service_url);

        let result = extract_result(&response)?;

        let mut page = self.page.write().await;
        let replaced = self.replacer.replace_sections(&mut page, &response).await?;
        drop(page);
        self.sections_replaced.fetch_add(replaced, Ordering::SeqCst);

        tracing::debug!("Server-assisted authorization complete");
        Ok(result)
    }
}

#[async_trait::async_trait]
impl AccessAdapter for ServerAdapter {
    fn authorization_url(&self) -> String {
        self.client.authorization_url()
    }

    fn authorization_timeout(&self) -> Duration {
        self.client.authorization_timeout()
    }

    fn is_authorization_enabled(&self) -> bool {
        true
    }

    fn is_pingback_enabled(&self) -> bool {
        true
    }

    async fn authorize(&self) -> Result<AuthorizationResult> {
        let mode = self.mode();
        tracing::debug!("Authorization mode selected: {:?}", mode);
        match mode {
            AccessMode::ClientFallback => self.client.authorize().await,
            AccessMode::ServerAssisted => self.authorize_on_server().await,
        }
    }

    async fn pingback(&self) -> Result<()> {
        self.client.pingback().await
    }
}

impl std::fmt::Debug for ServerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerAdapter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("context", &self.context)
            .field("service_url", &self.service_url)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}
