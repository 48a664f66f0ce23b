//! URL variable collection
//!
//! Authorization and pingback URLs are templates containing variable
//! names (e.g. `READER_ID`). A [`UrlVarsCollector`] resolves the values;
//! [`expand_url`] substitutes them into a template.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Result;

/// Variable values as collected, before string coercion.
pub type UrlVars = serde_json::Map<String, Value>;

/// Resolves the variables referenced by a URL template.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UrlVarsCollector: Send + Sync {
    /// Collect variable values for `url_template`.
    ///
    /// `use_auth_data` is false for the initial authorization call, when
    /// no authorization response exists yet to draw values from.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying variable source fails with.
    async fn collect_url_vars(&self, url_template: &str, use_auth_data: bool) -> Result<UrlVars>;
}

/// Collector returning a fixed set of variables.
///
/// # Examples
///
/// ```
/// use accessgate::access::StaticUrlVars;
///
/// let vars = StaticUrlVars::from_pairs([("READER_ID", "reader1")]);
/// assert_eq!(vars.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticUrlVars {
    vars: UrlVars,
}

impl StaticUrlVars {
    /// Create a collector over `vars`
    pub fn new(vars: UrlVars) -> Self {
        Self { vars }
    }

    /// Create a collector from name/value string pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { vars }
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are set
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[async_trait::async_trait]
impl UrlVarsCollector for StaticUrlVars {
    async fn collect_url_vars(&self, _url_template: &str, _use_auth_data: bool) -> Result<UrlVars> {
        Ok(self.vars.clone())
    }
}

/// String form of a collected value.
///
/// Strings pass through, `null` becomes `"null"`, everything else uses its
/// JSON text (so `123` becomes `"123"` and `true` becomes `"true"`).
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce every collected value to a string.
pub fn stringify_vars(vars: &UrlVars) -> BTreeMap<String, String> {
    vars.iter()
        .map(|(name, value)| (name.clone(), stringify_value(value)))
        .collect()
}

/// Replace each variable name in `template` with its URL-encoded value.
///
/// Longer names are substituted first so a name never clobbers a longer
/// name it prefixes.
pub fn expand_url(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut names: Vec<&String> = vars.keys().filter(|name| !name.is_empty()).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut expanded = template.to_string();
    for name in names {
        let encoded: String = url::form_urlencoded::byte_serialize(vars[name].as_bytes()).collect();
        expanded = expanded.replace(name.as_str(), &encoded);
    }
    expanded
}
