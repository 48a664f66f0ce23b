//! Plain HTTP client adapter
//!
//! Performs authorization by calling the publisher's authorization
//! endpoint directly and reports views through the pingback endpoint.
//! Used on its own for `client` access pages and as the fallback inside
//! [`crate::access::ServerAdapter`].

use std::sync::Arc;
use std::time::Duration;

use crate::access::fetcher::FORM_CONTENT_TYPE;
use crate::access::resolver::{AccessConfiguration, RawAccessConfig};
use crate::access::vars::{expand_url, stringify_vars, UrlVarsCollector};
use crate::access::{AccessAdapter, AuthorizationResult};
use crate::error::{AccessError, Result};

/// Client adapter talking to the authorization and pingback endpoints.
pub struct HttpClientAdapter {
    config: AccessConfiguration,
    url_vars: Arc<dyn UrlVarsCollector>,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpClientAdapter {
    /// Create an adapter for a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: AccessConfiguration,
        url_vars: Arc<dyn UrlVarsCollector>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AccessError::Http)?;
        Ok(Self {
            config,
            url_vars,
            http,
            timeout,
        })
    }

    /// Validate `raw` and create an adapter for it
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] if `raw` is invalid.
    pub fn from_raw(
        raw: &RawAccessConfig,
        url_vars: Arc<dyn UrlVarsCollector>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::new(AccessConfiguration::from_raw(raw)?, url_vars, timeout)
    }

    async fn expand(&self, template: &str, use_auth_data: bool) -> Result<String> {
        let vars = self
            .url_vars
            .collect_url_vars(template, use_auth_data)
            .await?;
        Ok(expand_url(template, &stringify_vars(&vars)))
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> AccessError {
        if e.is_timeout() {
            AccessError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            AccessError::Transport(format!("request to {} failed: {}", url, e))
        }
    }
}

#[async_trait::async_trait]
impl AccessAdapter for HttpClientAdapter {
    fn authorization_url(&self) -> String {
        self.config.authorization_url.clone()
    }

    fn authorization_timeout(&self) -> Duration {
        self.timeout
    }

    fn is_authorization_enabled(&self) -> bool {
        true
    }

    fn is_pingback_enabled(&self) -> bool {
        true
    }

    async fn authorize(&self) -> Result<AuthorizationResult> {
        let url = self.expand(&self.config.authorization_url, false).await?;
        tracing::debug!("Client authorization request to {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                AccessError::Transport(format!("HTTP {} for {}", status.as_u16(), url)).into(),
            );
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;
        serde_json::from_str::<AuthorizationResult>(&body).map_err(|e| {
            AccessError::Parse(format!("authorization response is not JSON: {}", e)).into()
        })
    }

    async fn pingback(&self) -> Result<()> {
        let url = self.expand(&self.config.pingback_url, true).await?;
        tracing::debug!("Pingback to {}", url);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body("")
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                AccessError::Transport(format!("HTTP {} for {}", status.as_u16(), url)).into(),
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpClientAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientAdapter")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
