//! Document-to-markup conversion.
//!
//! The stage order is fixed. Frontmatter must be gone before the marker
//! heading is inserted, and the outline must be built from the same
//! heading sequence the anchor stage later assigns ids to.

use folio_fetch::Fetch;
use serde_json::{Map, Value};

use crate::annotate::annotate_code_blocks;
use crate::frontmatter::extract_frontmatter;
use crate::markup::{TreeNode, format_tree, parse_fragment, serialize};
use crate::remote::resolve_src_directive;
use crate::renderer::HtmlRenderer;
use crate::toc::{assign_anchor_ids, build_outline, insert_toc_heading};
use crate::{ContentTree, RenderError};

/// Settings for [`convert`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Deepest heading level listed in the outline.
    pub toc_max_depth: u8,
    /// Base URL of the upstream repository, used by the `src:` directive.
    pub repo_base: String,
    /// Directory under `repo_base` holding upstream documents.
    pub repo_src_dir: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            toc_max_depth: 2,
            repo_base: String::new(),
            repo_src_dir: String::new(),
        }
    }
}

/// Convert a markdown document to serialized, pretty-formatted markup.
///
/// Frontmatter keys are merged into `config`.
///
/// # Errors
///
/// Fails when the `src:` body cannot be fetched, the frontmatter is not a
/// YAML mapping, or the rendered HTML cannot be tokenized.
pub fn convert(
    document: &str,
    config: &mut Map<String, Value>,
    options: &ConvertOptions,
    fetcher: &dyn Fetch,
) -> Result<String, RenderError> {
    let markup = convert_to_markup(document, config, options, fetcher)?;
    Ok(serialize(&markup))
}

/// Like [`convert`], but returns the formatted markup tree.
pub fn convert_to_markup(
    document: &str,
    config: &mut Map<String, Value>,
    options: &ConvertOptions,
    fetcher: &dyn Fetch,
) -> Result<TreeNode, RenderError> {
    let document = resolve_src_directive(
        document,
        &options.repo_base,
        &options.repo_src_dir,
        fetcher,
    )?;

    let mut tree = ContentTree::parse(&document);
    extract_frontmatter(&mut tree, config)?;
    insert_toc_heading(&mut tree);
    build_outline(&mut tree, options.toc_max_depth);
    assign_anchor_ids(&mut tree);
    annotate_code_blocks(&mut tree);

    let html = HtmlRenderer::new().render(tree.into_events());
    let mut markup = parse_fragment(&html);
    format_tree(&mut markup);
    Ok(markup)
}
