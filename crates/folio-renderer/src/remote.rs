//! The `src:` frontmatter directive: pull a document body from the
//! upstream repository.

use std::borrow::Cow;
use std::sync::LazyLock;

use folio_fetch::Fetch;
use regex::Regex;

use crate::RenderError;
use crate::frontmatter::split_frontmatter;

/// Upstream heading anchors, e.g. `# {#guide-ctransfers}`.
static ANCHOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"# \{#(.*)\}").expect("invalid anchor regex"));

/// Replace the body of `document` with remote content when its
/// frontmatter has a `src:` line.
///
/// The line is matched with all spaces removed; the fetched URL is
/// `repo_base + repo_src_dir + value`. The original frontmatter block is
/// kept in front of the transformed remote body. Documents without the
/// directive are returned unchanged.
///
/// # Errors
///
/// Returns [`RenderError::Fetch`] when the remote body cannot be loaded.
pub fn resolve_src_directive<'a>(
    document: &'a str,
    repo_base: &str,
    repo_src_dir: &str,
    fetcher: &dyn Fetch,
) -> Result<Cow<'a, str>, RenderError> {
    let Some((block, _)) = split_frontmatter(document) else {
        return Ok(Cow::Borrowed(document));
    };

    let Some(target) = block.lines().find_map(src_target) else {
        return Ok(Cow::Borrowed(document));
    };

    let url = format!("{repo_base}{repo_src_dir}{target}");
    tracing::debug!(url = %url, "Resolving src directive");
    let remote = fetcher.fetch(&url)?;

    Ok(Cow::Owned(format!("{block}\n{}", transform_dialect(&remote))))
}

fn src_target(line: &str) -> Option<String> {
    let compact = line.replace(' ', "");
    compact.trim().strip_prefix("src:").map(str::to_owned)
}

/// Rewrite upstream markdown dialect into plain markdown, line by line.
///
/// - `# {#anchor}` becomes `#`;
/// - ```` ```reach ```` fences become ```` ```js ````;
/// - `${toc}` placeholders are removed.
///
/// Every input line, including a trailing empty one, is followed by `\n`.
#[must_use]
pub fn transform_dialect(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 16);
    for line in markdown.split('\n') {
        let line = ANCHOR_PATTERN.replace(line, "#");
        let line = line.replacen("```reach", "```js", 1);
        let line = line.replacen("${toc}", "", 1);
        out.push_str(&line);
        out.push('\n');
    }
    out
}
