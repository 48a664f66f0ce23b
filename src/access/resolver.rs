//! Access configuration resolution
//!
//! Validates the raw access configuration and reads the server-rendered
//! state token from the page. Both are resolved once, when an adapter is
//! constructed, and never change afterwards.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::access::{ACCESS_CONFIG_ELEMENT_ID, STATE_META_NAME};
use crate::document::Document;
use crate::error::{AccessError, Result};

/// Which adapter handles authorization for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Authorization is always performed by the client adapter
    #[default]
    Client,
    /// Server-assisted authorization with client fallback
    Server,
}

/// Access configuration as written by the publisher, before validation.
///
/// # Examples
///
/// ```
/// use accessgate::access::{AccessType, RawAccessConfig};
///
/// let raw: RawAccessConfig = serde_json::from_str(
///     r#"{"type": "server", "authorization": "https://acme.com/a", "pingback": "https://acme.com/p"}"#,
/// ).unwrap();
/// assert_eq!(raw.access_type, AccessType::Server);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAccessConfig {
    /// Adapter type
    #[serde(rename = "type", default)]
    pub access_type: AccessType,

    /// Authorization URL template
    #[serde(default)]
    pub authorization: Option<String>,

    /// Pingback URL template
    #[serde(default)]
    pub pingback: Option<String>,
}

impl RawAccessConfig {
    /// Read the configuration embedded in the page's `amp-access` script
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] if the script is missing or its
    /// content is not a valid configuration object.
    pub fn from_page(page: &Document) -> Result<Self> {
        let text = page.element_text_by_id(ACCESS_CONFIG_ELEMENT_ID).ok_or_else(|| {
            AccessError::Config(format!(
                "page has no #{} configuration element",
                ACCESS_CONFIG_ELEMENT_ID
            ))
        })?;
        serde_json::from_str(text.trim()).map_err(|e| {
            AccessError::Config(format!("invalid #{} JSON: {}", ACCESS_CONFIG_ELEMENT_ID, e)).into()
        })
    }
}

/// Validated access configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfiguration {
    /// Authorization URL template
    pub authorization_url: String,
    /// Pingback URL template
    pub pingback_url: String,
}

impl AccessConfiguration {
    /// Validate a raw configuration
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] naming the offending field when
    /// `authorization` or `pingback` is missing, empty, or not an https
    /// (or localhost http) URL.
    pub fn from_raw(raw: &RawAccessConfig) -> Result<Self> {
        let authorization_url = required_url("authorization", raw.authorization.as_deref())?;
        let pingback_url = required_url("pingback", raw.pingback.as_deref())?;
        Ok(Self {
            authorization_url,
            pingback_url,
        })
    }
}

fn required_url(field: &str, value: Option<&str>) -> Result<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AccessError::Config(format!("\"{}\" URL must be specified", field)).into());
    }

    let parsed = Url::parse(value)
        .map_err(|e| AccessError::Config(format!("\"{}\" URL is invalid: {}", field, e)))?;
    let local = matches!(parsed.host_str(), Some("localhost" | "127.0.0.1"));
    match parsed.scheme() {
        "https" => Ok(value.to_string()),
        "http" if local => Ok(value.to_string()),
        _ => Err(AccessError::Config(format!(
            "\"{}\" URL must be https or localhost: {}",
            field, value
        ))
        .into()),
    }
}

/// Server-rendered state token read from the page.
///
/// `None` means the page was not pre-rendered with access state, so
/// server-assisted authorization is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerState(Option<String>);

impl ServerState {
    /// Wrap an optional token; empty tokens count as absent
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.is_empty()))
    }

    /// Read the token from the page's state meta marker
    pub fn from_page(page: &Document) -> Self {
        Self::new(page.meta_content(STATE_META_NAME))
    }

    /// The token, if present
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether a token is present
    pub fn is_available(&self) -> bool {
        self.0.is_some()
    }
}

/// Configuration and server state resolved for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccess {
    /// Validated configuration
    pub config: AccessConfiguration,
    /// State token read from the page
    pub state: ServerState,
}

/// Validate `raw` and read the server state from `page`
///
/// The page is only read, never modified.
///
/// # Errors
///
/// Returns [`AccessError::Config`] if the configuration is invalid. A
/// missing state marker is not an error.
pub fn resolve(raw: &RawAccessConfig, page: &Document) -> Result<ResolvedAccess> {
    let config = AccessConfiguration::from_raw(raw)?;
    let state = ServerState::from_page(page);
    tracing::debug!(
        "Resolved access configuration: server state {}",
        if state.is_available() { "present" } else { "absent" }
    );
    Ok(ResolvedAccess { config, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(authorization: Option<&str>, pingback: Option<&str>) -> RawAccessConfig {
        RawAccessConfig {
            access_type: AccessType::Server,
            authorization: authorization.map(str::to_string),
            pingback: pingback.map(str::to_string),
        }
    }

    fn config_error(result: Result<ResolvedAccess>) -> String {
        let err = result.unwrap_err();
        match err.downcast_ref::<AccessError>() {
            Some(AccessError::Config(msg)) => msg.clone(),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_reads_state_marker() {
        let page = Document::parse(r#"<meta name="i-amp-access-state" content="STATE1">"#);
        let resolved = resolve(
            &raw(Some("https://acme.com/a?rid=READER_ID"), Some("https://acme.com/p")),
            &page,
        )
        .unwrap();
        assert_eq!(resolved.state.token(), Some("STATE1"));
        assert_eq!(
            resolved.config.authorization_url,
            "https://acme.com/a?rid=READER_ID"
        );
        assert_eq!(resolved.config.pingback_url, "https://acme.com/p");
    }

    #[test]
    fn test_resolve_without_state_marker_is_not_an_error() {
        let page = Document::parse("<html><body></body></html>");
        let resolved = resolve(
            &raw(Some("https://acme.com/a"), Some("https://acme.com/p")),
            &page,
        )
        .unwrap();
        assert!(!resolved.state.is_available());
        assert_eq!(resolved.state.token(), None);
    }

    #[test]
    fn test_empty_state_marker_counts_as_absent() {
        let page = Document::parse(r#"<meta name="i-amp-access-state" content="">"#);
        assert!(!ServerState::from_page(&page).is_available());
    }

    #[test]
    fn test_missing_authorization_names_field() {
        let page = Document::default();
        let msg = config_error(resolve(&raw(None, Some("https://acme.com/p")), &page));
        assert!(msg.contains("\"authorization\""), "message was {}", msg);
    }

    #[test]
    fn test_empty_authorization_names_field() {
        let page = Document::default();
        let msg = config_error(resolve(&raw(Some("  "), Some("https://acme.com/p")), &page));
        assert!(msg.contains("\"authorization\""));
    }

    #[test]
    fn test_missing_pingback_names_field() {
        let page = Document::default();
        let msg = config_error(resolve(&raw(Some("https://acme.com/a"), None), &page));
        assert!(msg.contains("\"pingback\""), "message was {}", msg);
    }

    #[test]
    fn test_non_https_url_rejected() {
        let page = Document::default();
        let msg = config_error(resolve(
            &raw(Some("http://acme.com/a"), Some("https://acme.com/p")),
            &page,
        ));
        assert!(msg.contains("must be https"));
    }

    #[test]
    fn test_localhost_http_allowed() {
        let page = Document::default();
        assert!(resolve(
            &raw(Some("http://localhost:8000/a"), Some("http://127.0.0.1:9/p")),
            &page
        )
        .is_ok());
    }

    #[test]
    fn test_raw_config_from_page() {
        let page = Document::parse(
            r#"<script id="amp-access" type="application/json">
                {"type": "server", "authorization": "https://acme.com/a", "pingback": "https://acme.com/p"}
            </script>"#,
        );
        let raw = RawAccessConfig::from_page(&page).unwrap();
        assert_eq!(raw.access_type, AccessType::Server);
        assert_eq!(raw.pingback.as_deref(), Some("https://acme.com/p"));
    }

    #[test]
    fn test_raw_config_defaults_to_client_type() {
        let raw: RawAccessConfig = serde_json::from_str(r#"{"authorization": "x"}"#).unwrap();
        assert_eq!(raw.access_type, AccessType::Client);
    }

    #[test]
    fn test_raw_config_from_page_missing_element() {
        let err = RawAccessConfig::from_page(&Document::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AccessError>(),
            Some(AccessError::Config(_))
        ));
    }
}
