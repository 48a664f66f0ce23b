//! Content authorization adapters
//!
//! This module holds the authorization flow and its collaborators:
//!
//! - [`resolver`] -- validates the access configuration and reads the
//!   server-rendered state token from the page
//! - [`mode`] -- chooses server-assisted or client-fallback authorization
//! - [`request`] -- builds the authorization request payload
//! - [`fetcher`] -- document transport and the deadline-bounded fetcher
//! - [`response`] -- extracts the authorization result from a response
//! - [`sections`] -- reconciles page sections with the response markup
//! - [`server`] -- the server-assisted adapter tying it all together
//! - [`client`] -- a plain HTTP client adapter used as the fallback
//! - [`vars`] -- URL variable collection
//!
//! # Canonical Import Path
//!
//! ```no_run
//! use accessgate::access::{AccessAdapter, ServerAdapter};
//! ```

use std::time::Duration;

use crate::error::Result;

pub mod client;
pub mod fetcher;
pub mod mode;
pub mod request;
pub mod resolver;
pub mod response;
pub mod sections;
pub mod server;
pub mod vars;

pub use client::HttpClientAdapter;
pub use fetcher::{DocumentTransport, FetchOptions, ReqwestTransport, TimedFetcher};
pub use mode::{select_mode, AccessMode, OriginKind};
pub use request::{AuthorizationRequest, RequestBuilder};
pub use resolver::{AccessConfiguration, AccessType, RawAccessConfig, ResolvedAccess, ServerState};
pub use response::extract_result;
pub use sections::SectionReplacer;
pub use server::{Collaborators, PageContext, ServerAdapter};
pub use vars::{StaticUrlVars, UrlVarsCollector};

/// Meta marker carrying the server-rendered state token.
pub const STATE_META_NAME: &str = "i-amp-access-state";

/// Id of the structured-data element in a service response.
pub const ACCESS_DATA_ELEMENT_ID: &str = "amp-access-data";

/// Id of the page-embedded access configuration script.
pub const ACCESS_CONFIG_ELEMENT_ID: &str = "amp-access";

/// Opaque authorization result returned by an authorization endpoint.
///
/// Never destructured by this crate; callers interpret its fields.
pub type AuthorizationResult = serde_json::Value;

/// An authorization adapter.
///
/// Implemented by the plain client adapter and by [`ServerAdapter`],
/// which wraps a client adapter and falls back to it when server-assisted
/// authorization is not available.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccessAdapter: Send + Sync {
    /// Authorization URL template, before variable substitution.
    fn authorization_url(&self) -> String;

    /// Deadline applied to an authorization call.
    fn authorization_timeout(&self) -> Duration;

    /// Whether this adapter performs authorization at all.
    fn is_authorization_enabled(&self) -> bool;

    /// Whether this adapter sends pingbacks.
    fn is_pingback_enabled(&self) -> bool;

    /// Run authorization and return the endpoint's result.
    ///
    /// # Errors
    ///
    /// Returns the adapter's transport, timeout or parse failure.
    async fn authorize(&self) -> Result<AuthorizationResult>;

    /// Report that the reader viewed the document.
    ///
    /// # Errors
    ///
    /// Returns the adapter's transport failure.
    async fn pingback(&self) -> Result<()>;
}
