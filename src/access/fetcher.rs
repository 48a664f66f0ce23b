//! Document transport and deadline-bounded fetching
//!
//! [`DocumentTransport`] is the seam to the network: it fetches a URL and
//! parses the body into a [`Document`]. [`ReqwestTransport`] is the
//! production implementation.
//!
//! [`TimedFetcher`] posts an [`AuthorizationRequest`] through a transport
//! and races it against a deadline. The fetch runs as its own task, so
//! when the deadline wins the fetch is left to finish in the background
//! and its outcome is dropped unseen. Exactly one outcome is produced per
//! call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;

use crate::access::request::AuthorizationRequest;
use crate::document::Document;
use crate::error::{AccessError, Result};

/// Content type of the authorization service request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default deadline for a server-assisted authorization fetch.
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_millis(3000);

/// Request options passed to a [`DocumentTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// HTTP method
    pub method: Method,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<String>,
}

impl FetchOptions {
    /// A plain GET
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A form-encoded POST carrying `body`
    pub fn post_form(body: String) -> Self {
        Self {
            method: Method::POST,
            headers: vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(body),
        }
    }

    /// Add a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of the first header named `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Fetches documents over the network.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentTransport: Send + Sync {
    /// Fetch `url` and parse the response body as a document.
    ///
    /// # Errors
    ///
    /// Returns the transport's failure (network error, non-success
    /// status, unreadable body).
    async fn fetch_document(&self, url: &str, options: FetchOptions) -> Result<Document>;
}

/// Upper bound on a single transport request.
///
/// [`TimedFetcher`] enforces the authorization deadline; this only stops
/// an abandoned fetch from holding its connection forever.
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`DocumentTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport bounded by [`DEFAULT_TRANSPORT_TIMEOUT`]
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TRANSPORT_TIMEOUT)
    }

    /// Create a transport whose requests give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AccessError::Http)?;
        Ok(Self { client })
    }

    /// Create a transport over an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DocumentTransport for ReqwestTransport {
    async fn fetch_document(&self, url: &str, options: FetchOptions) -> Result<Document> {
        let mut request = self.client.request(options.method, url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            AccessError::Transport(format!("request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                AccessError::Transport(format!("HTTP {} for {}", status.as_u16(), url)).into(),
            );
        }

        let body = response
            .text()
            .await
            .map_err(|e| AccessError::Transport(format!("failed to read response body: {}", e)))?;

        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(Document::parse(body))
    }
}

/// Encode a request as the single form field `request=<json>`.
///
/// # Errors
///
/// Returns a serialization error if the request cannot be encoded.
pub fn encode_request_body(request: &AuthorizationRequest) -> Result<String> {
    let json = request.to_json()?;
    Ok(url::form_urlencoded::Serializer::new(String::new())
        .append_pair("request", &json)
        .finish())
}

/// Posts authorization requests under a hard deadline.
#[derive(Clone)]
pub struct TimedFetcher {
    transport: Arc<dyn DocumentTransport>,
    timeout: Duration,
}

impl TimedFetcher {
    /// Create a fetcher with the given deadline
    pub fn new(transport: Arc<dyn DocumentTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// The configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `request` to `service_url` and wait for the response document
    ///
    /// # Errors
    ///
    /// - [`AccessError::Timeout`] if the deadline elapses first; the fetch
    ///   is not cancelled but its eventual outcome is ignored
    /// - the transport's own error, unaltered, if the fetch fails first
    pub async fn fetch(&self, service_url: &str, request: &AuthorizationRequest) -> Result<Document> {
        let options = FetchOptions::post_form(encode_request_body(request)?);
        let transport = Arc::clone(&self.transport);
        let url = service_url.to_string();

        let task = tokio::spawn(async move { transport.fetch_document(&url, options).await });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                Err(AccessError::Transport(format!("fetch task failed: {}", join_error)).into())
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(
                    "Authorization fetch to {} exceeded {}ms",
                    service_url,
                    timeout_ms
                );
                Err(AccessError::Timeout { timeout_ms }.into())
            }
        }
    }
}

impl std::fmt::Debug for TimedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}
