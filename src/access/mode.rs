//! Authorization mode selection

use serde::{Deserialize, Serialize};
use url::Url;

use crate::access::resolver::ServerState;

/// How the page reached the reader. Fixed per page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    /// Served through an intermediary cache
    Proxied,
    /// Served by the publisher origin
    Direct,
}

impl OriginKind {
    /// Classify a page URL against the known proxy hosts.
    ///
    /// A host matches when it equals a proxy host or is a subdomain of
    /// one. Unparseable URLs are treated as direct.
    ///
    /// # Examples
    ///
    /// ```
    /// use accessgate::access::OriginKind;
    ///
    /// let hosts = vec!["cdn.ampproject.org".to_string()];
    /// assert_eq!(
    ///     OriginKind::detect("https://acme-com.cdn.ampproject.org/c/s/acme.com/a", &hosts),
    ///     OriginKind::Proxied
    /// );
    /// assert_eq!(OriginKind::detect("https://acme.com/a", &hosts), OriginKind::Direct);
    /// ```
    pub fn detect(page_url: &str, proxy_hosts: &[String]) -> Self {
        let Some(host) = Url::parse(page_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return Self::Direct;
        };

        let proxied = proxy_hosts.iter().any(|proxy| {
            let proxy = proxy.to_ascii_lowercase();
            host == proxy || host.ends_with(&format!(".{}", proxy))
        });

        if proxied {
            Self::Proxied
        } else {
            Self::Direct
        }
    }
}

/// Outcome of mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Authorize through the service and swap in pre-rendered sections
    ServerAssisted,
    /// Delegate entirely to the client adapter
    ClientFallback,
}

/// Choose the authorization mode.
///
/// Server-assisted authorization needs both a proxied origin and a
/// server-rendered state token; anything else falls back to the client.
pub fn select_mode(origin: OriginKind, state: &ServerState) -> AccessMode {
    if origin != OriginKind::Proxied || !state.is_available() {
        return AccessMode::ClientFallback;
    }
    AccessMode::ServerAssisted
}
