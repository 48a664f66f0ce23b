//! Lightweight markup document model
//!
//! Pages and service responses are handled as markup strings with an
//! element index built by a lenient tag scanner. The scanner understands
//! just enough HTML for the authorization flow:
//!
//! - `<meta name=... content=...>` markers in the page head
//! - elements addressed by `id` (the embedded JSON data element)
//! - elements carrying a [`SECTION_ID_ATTRIBUTE`] attribute, whose inner
//!   markup can be swapped in place
//!
//! Comments are skipped and `script`/`style` bodies are treated as raw
//! text, so markup inside them never produces elements.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Attribute binding a page region to its counterpart in a fetched document.
pub const SECTION_ID_ATTRIBUTE: &str = "i-amp-access-id";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Static pattern, verified by the tests below.
        Regex::new(
            r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#,
        )
        .expect("tag pattern must compile")
    })
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern must compile")
    })
}

/// Stable composite identifier of a swappable page region (e.g. `"1/2"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Create a section id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A section found in a document: its id and raw inner markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Identifier from the section attribute
    pub id: SectionId,
    /// Inner markup of the section element
    pub content: String,
}

#[derive(Debug, Clone)]
struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
    attrs: Vec<(String, String)>,
    span: Range<usize>,
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    open_end: usize,
    inner: Option<Range<usize>>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A parsed markup document.
///
/// Parsing never fails: malformed markup simply yields fewer addressable
/// elements. Unclosed elements have no inner range and are never
/// reported as sections.
#[derive(Debug, Clone, Default)]
pub struct Document {
    html: String,
    elements: Vec<Element>,
}

impl Document {
    /// Parse markup into a document
    ///
    /// # Examples
    ///
    /// ```
    /// use accessgate::document::Document;
    ///
    /// let doc = Document::parse(r#"<div i-amp-access-id="1/1">hello</div>"#);
    /// assert_eq!(doc.sections()[0].content, "hello");
    /// ```
    pub fn parse(html: impl Into<String>) -> Self {
        let html = html.into();
        let elements = build_elements(tokenize(&html));
        Self { html, elements }
    }

    /// The document markup
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Consume the document, returning its markup
    pub fn into_html(self) -> String {
        self.html
    }

    /// Content of the first `<meta name="{name}">` element, if any
    pub fn meta_content(&self, name: &str) -> Option<String> {
        self.elements
            .iter()
            .filter(|el| el.name == "meta")
            .find(|el| el.attr("name") == Some(name))
            .and_then(|el| el.attr("content"))
            .map(str::to_string)
    }

    /// Inner text of the first closed element whose `id` equals `id`
    pub fn element_text_by_id(&self, id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|el| el.attr("id") == Some(id))
            .and_then(|el| el.inner.clone())
            .map(|inner| &self.html[inner])
    }

    /// Every closed section element in document order
    pub fn sections(&self) -> Vec<Section> {
        self.elements
            .iter()
            .filter_map(|el| {
                let id = el.attr(SECTION_ID_ATTRIBUTE)?;
                let inner = el.inner.clone()?;
                Some(Section {
                    id: SectionId::new(id),
                    content: self.html[inner].to_string(),
                })
            })
            .collect()
    }

    /// Ids of every closed section element in document order
    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections().into_iter().map(|s| s.id).collect()
    }

    /// Section contents keyed by id; the first element wins on duplicates
    pub fn section_map(&self) -> HashMap<SectionId, String> {
        let mut map = HashMap::new();
        for section in self.sections() {
            map.entry(section.id).or_insert(section.content);
        }
        map
    }

    /// Swap the inner markup of every section whose id is in `contents`.
    ///
    /// The section elements themselves (tag name, attributes, position)
    /// are kept. Sections nested inside a section that was replaced are
    /// gone with the old markup and are not visited.
    ///
    /// Returns the number of sections replaced.
    pub fn replace_section_contents(&mut self, contents: &BTreeMap<SectionId, String>) -> usize {
        let mut edits: Vec<(Range<usize>, &str)> = Vec::new();
        let mut covered_until = 0;

        for el in &self.elements {
            let Some(id) = el.attr(SECTION_ID_ATTRIBUTE) else {
                continue;
            };
            let Some(inner) = el.inner.clone() else {
                tracing::debug!("Skipping unclosed section {}", id);
                continue;
            };
            if inner.start < covered_until {
                continue;
            }
            if let Some(content) = contents.get(id) {
                covered_until = inner.end;
                edits.push((inner, content.as_str()));
            }
        }

        if edits.is_empty() {
            return 0;
        }

        let mut out = String::with_capacity(self.html.len());
        let mut cursor = 0;
        for (range, content) in &edits {
            out.push_str(&self.html[cursor..range.start]);
            out.push_str(content);
            cursor = range.end;
        }
        out.push_str(&self.html[cursor..]);

        let replaced = edits.len();
        *self = Self::parse(out);
        replaced
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

fn tokenize(html: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(caps) = token_regex().captures_at(html, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        pos = whole.end();

        // Comments match without a tag name.
        let Some(name) = caps.get(2) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = !closing
            && (caps.get(4).is_some_and(|m| !m.as_str().is_empty())
                || VOID_ELEMENTS.contains(&name.as_str()));
        let attrs = if closing {
            Vec::new()
        } else {
            parse_attributes(caps.get(3).map_or("", |m| m.as_str()))
        };

        if !closing && !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            pos = raw_text_end(html, pos, &name);
        }

        tags.push(Tag {
            name,
            closing,
            self_closing,
            attrs,
            span: whole.range(),
        });
    }

    tags
}

fn raw_text_end(html: &str, from: usize, name: &str) -> usize {
    let needle = format!("</{name}");
    html[from..]
        .to_ascii_lowercase()
        .find(&needle)
        .map_or(html.len(), |offset| from + offset)
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    attribute_regex()
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or(String::new(), |m| {
                    html_escape::decode_html_entities(m.as_str()).into_owned()
                });
            Some((name, value))
        })
        .collect()
}

fn build_elements(tags: Vec<Tag>) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for tag in tags {
        if tag.closing {
            let matching = open
                .iter()
                .rposition(|&index| elements[index].name == tag.name);
            if let Some(depth) = matching {
                let index = open[depth];
                elements[index].inner = Some(elements[index].open_end..tag.span.start);
                open.truncate(depth);
            }
            continue;
        }

        elements.push(Element {
            name: tag.name,
            attrs: tag.attrs,
            open_end: tag.span.end,
            inner: None,
        });
        if !tag.self_closing {
            open.push(elements.len() - 1);
        }
    }

    elements
}
