//! Section reconciliation
//!
//! Swaps the content of live page sections with their counterparts in a
//! service response, matched by [`SectionId`]. Planning the swap is a
//! pure function ([`plan_replacements`]); applying it is the only
//! mutation of the live page in the whole authorization flow.

use std::collections::{BTreeMap, HashMap};

use crate::document::{Document, SectionId};
use crate::error::Result;

/// Content to install per live section id.
///
/// Only ids present in `live_ids` are kept; response-only ids are
/// dropped, and live ids missing from the response are left out so their
/// sections stay untouched.
pub fn plan_replacements(
    live_ids: &[SectionId],
    response: &HashMap<SectionId, String>,
) -> BTreeMap<SectionId, String> {
    live_ids
        .iter()
        .filter_map(|id| response.get(id).map(|content| (id.clone(), content.clone())))
        .collect()
}

/// Applies response sections to the live page.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionReplacer;

impl SectionReplacer {
    /// Create a replacer
    pub fn new() -> Self {
        Self
    }

    /// Replace live section contents with matching response sections
    ///
    /// Each live element keeps its own tag and attributes; only its inner
    /// markup changes. Nothing is ever inserted into the live page.
    ///
    /// Returns the number of sections replaced.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for replacement
    /// steps that can fail.
    pub async fn replace_sections(&self, live: &mut Document, response: &Document) -> Result<usize> {
        let live_ids = live.section_ids();
        let plan = plan_replacements(&live_ids, &response.section_map());

        for id in live_ids.iter().filter(|id| !plan.contains_key(*id)) {
            tracing::debug!("Section {} not in response; leaving it untouched", id);
        }

        let replaced = live.replace_section_contents(&plan);
        tracing::debug!(
            "Replaced {} of {} live sections",
            replaced,
            live_ids.len()
        );
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{live_page, service_response};

    fn ids(raw: &[&str]) -> Vec<SectionId> {
        raw.iter().map(|id| SectionId::from(*id)).collect()
    }

    #[test]
    fn test_plan_restricted_to_live_ids() {
        let mut response = HashMap::new();
        response.insert(SectionId::from("1/1"), "a1".to_string());
        response.insert(SectionId::from("1/2"), "a2".to_string());
        response.insert(SectionId::from("a3"), "a3".to_string());

        let plan = plan_replacements(&ids(&["1/1", "1/2"]), &response);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan["1/1"], "a1");
        assert_eq!(plan["1/2"], "a2");
        assert!(!plan.contains_key("a3"));
    }

    #[test]
    fn test_plan_skips_live_ids_missing_from_response() {
        let mut response = HashMap::new();
        response.insert(SectionId::from("1/2"), "a2".to_string());

        let plan = plan_replacements(&ids(&["1/1", "1/2"]), &response);
        assert_eq!(plan.keys().cloned().collect::<Vec<_>>(), ids(&["1/2"]));
    }

    #[tokio::test]
    async fn test_replace_sections_matches_ids_and_ignores_extras() {
        let mut live = live_page(Some("STATE1"));
        let response = Document::parse(service_response("{}"));

        let replaced = SectionReplacer::new()
            .replace_sections(&mut live, &response)
            .await
            .unwrap();

        assert_eq!(replaced, 2);
        let sections = live.section_map();
        assert_eq!(sections.get("1/1").map(String::as_str), Some("a1"));
        assert_eq!(sections.get("1/2").map(String::as_str), Some("a2"));
        assert!(!sections.contains_key("a3"));
        assert!(!live.html().contains("a3"));
    }

    #[tokio::test]
    async fn test_replace_sections_is_idempotent() {
        let mut live = live_page(None);
        let response = Document::parse(service_response("{}"));
        let replacer = SectionReplacer::new();

        replacer.replace_sections(&mut live, &response).await.unwrap();
        let once = live.html().to_string();
        replacer.replace_sections(&mut live, &response).await.unwrap();
        assert_eq!(live.html(), once);
    }

    #[tokio::test]
    async fn test_unmatched_live_section_untouched() {
        let mut live = Document::parse(
            r#"<div i-amp-access-id="1/1">old 1</div><div i-amp-access-id="9/9">keep</div>"#,
        );
        let response = Document::parse(r#"<div i-amp-access-id="1/1">new 1</div>"#);

        let replaced = SectionReplacer::new()
            .replace_sections(&mut live, &response)
            .await
            .unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(
            live.html(),
            r#"<div i-amp-access-id="1/1">new 1</div><div i-amp-access-id="9/9">keep</div>"#
        );
    }
}
