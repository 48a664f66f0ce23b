//! Authorization result extraction

use crate::access::{AuthorizationResult, ACCESS_DATA_ELEMENT_ID};
use crate::document::Document;
use crate::error::{AccessError, Result};

/// Extract the authorization result embedded in a service response.
///
/// The result is the JSON text of the `amp-access-data` element, returned
/// as-is without interpretation.
///
/// # Errors
///
/// Returns [`AccessError::Parse`] when the element is missing or its
/// content is not valid JSON. There is no empty-result fallback.
///
/// # Examples
///
/// ```
/// use accessgate::access::extract_result;
/// use accessgate::document::Document;
///
/// let doc = Document::parse(
///     r#"<script id="amp-access-data" type="application/json">{"access": "A"}</script>"#,
/// );
/// assert_eq!(extract_result(&doc).unwrap()["access"], "A");
/// ```
pub fn extract_result(document: &Document) -> Result<AuthorizationResult> {
    let text = document
        .element_text_by_id(ACCESS_DATA_ELEMENT_ID)
        .ok_or_else(|| {
            AccessError::Parse(format!(
                "response has no #{} element",
                ACCESS_DATA_ELEMENT_ID
            ))
        })?;

    serde_json::from_str(text.trim()).map_err(|e| {
        AccessError::Parse(format!(
            "#{} is not valid JSON: {}",
            ACCESS_DATA_ELEMENT_ID, e
        ))
        .into()
    })
}
