//! HTML fragment parsing with the HTML5 tree construction rules.
//!
//! Rendered markdown may carry any hand-written HTML, so the fragment is
//! parsed the way a browser parses the content of `<body>`: bare `&` and
//! `<` in text, unclosed elements, stray end tags and raw-text elements
//! such as `<script>` all recover instead of failing.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};

use super::sink::DomSink;
use super::tree::TreeNode;

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Whether `tag` is a void element.
#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parse an HTML fragment into an anonymous root node.
///
/// Comments, processing instructions and doctypes are dropped. Entities
/// are decoded and tag names lowercased.
#[must_use]
pub fn parse_fragment(html: &str) -> TreeNode {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes())
        .into_body()
}
