//! Code block annotation: fold fence info strings into one composite tag.
//!
//! A fence like ```` ```js unnumbered ```` carries a language and meta
//! tokens. The renderer only emits one `language-*` class, so both are
//! joined into a single `_`-separated tag (`js_unnumbered`) that the
//! snippet processor later splits apart again.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag};

use crate::ContentTree;

/// Join a language and meta string into a composite tag.
///
/// Meta tokens are whitespace separated. Returns `None` when both parts
/// are empty.
#[must_use]
pub fn composite_tag(lang: &str, meta: &str) -> Option<String> {
    let meta = meta.split_whitespace().collect::<Vec<_>>().join("_");
    match (lang.is_empty(), meta.is_empty()) {
        (true, true) => None,
        (false, true) => Some(lang.to_owned()),
        (true, false) => Some(meta),
        (false, false) => Some(format!("{lang}_{meta}")),
    }
}

/// Rewrite every fenced code block's info string to its composite tag.
///
/// Blocks without an info string are left untouched.
pub fn annotate_code_blocks(tree: &mut ContentTree<'_>) {
    for event in &mut tree.events {
        let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = event else {
            continue;
        };
        let trimmed = info.trim();
        let (lang, meta) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        if let Some(tag) = composite_tag(lang, meta) {
            *info = CowStr::from(tag);
        }
    }
}
