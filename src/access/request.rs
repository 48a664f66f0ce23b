//! Authorization request construction

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::access::resolver::ServerState;
use crate::access::vars::{stringify_vars, UrlVarsCollector};
use crate::error::Result;

/// Payload sent to the authorization service.
///
/// Serialized as `{"url": ..., "state": ..., "vars": {...}}`; `state` is
/// `null` when the page carried no server state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Page URL without its fragment
    pub url: String,
    /// Server state token
    pub state: Option<String>,
    /// Collected variables, all coerced to strings
    pub vars: BTreeMap<String, String>,
}

impl AuthorizationRequest {
    /// JSON form of the request
    ///
    /// # Errors
    ///
    /// Returns a serialization error; cannot happen for string-only data.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Remove the `#fragment` part of a URL, if any.
pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

/// Assembles [`AuthorizationRequest`]s from collected URL variables.
#[derive(Clone)]
pub struct RequestBuilder {
    url_vars: Arc<dyn UrlVarsCollector>,
}

impl RequestBuilder {
    /// Create a builder backed by `url_vars`
    pub fn new(url_vars: Arc<dyn UrlVarsCollector>) -> Self {
        Self { url_vars }
    }

    /// Build the request for an initial authorization call
    ///
    /// Variables are collected for `authorization_url` without
    /// authorization data, since none exists before the first response.
    ///
    /// # Arguments
    ///
    /// * `authorization_url` - Authorization URL template
    /// * `page_url` - Current page URL; its fragment is dropped
    /// * `state` - Server state captured when the adapter was built
    ///
    /// # Errors
    ///
    /// Propagates the variable collector's failure unchanged.
    pub async fn build(
        &self,
        authorization_url: &str,
        page_url: &str,
        state: &ServerState,
    ) -> Result<AuthorizationRequest> {
        let vars = self
            .url_vars
            .collect_url_vars(authorization_url, false)
            .await?;

        Ok(AuthorizationRequest {
            url: strip_fragment(page_url).to_string(),
            state: state.token().map(str::to_string),
            vars: stringify_vars(&vars),
        })
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder").finish_non_exhaustive()
    }
}
