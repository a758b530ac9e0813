//! Markdown to markup conversion for Folio pages.
//!
//! A document goes through a fixed sequence of stages, each a function
//! over a [`ContentTree`]:
//!
//! 1. [`resolve_src_directive`] swaps in a remote body when the
//!    frontmatter has a `src:` line;
//! 2. [`extract_frontmatter`] merges YAML frontmatter into the page config;
//! 3. [`insert_toc_heading`], [`build_outline`] and [`assign_anchor_ids`]
//!    add the outline and heading ids;
//! 4. [`annotate_code_blocks`] folds fence info strings into composite tags;
//! 5. [`HtmlRenderer`] renders events to HTML;
//! 6. the [`markup`] module parses, formats and serializes the result.
//!
//! [`convert`] runs them all.
//!
//! # Example
//!
//! ```
//! use folio_fetch::{Fetch, FetchError};
//! use folio_renderer::{ConvertOptions, convert};
//! use serde_json::Map;
//!
//! struct Offline;
//!
//! impl Fetch for Offline {
//!     fn fetch(&self, url: &str) -> Result<String, FetchError> {
//!         Err(FetchError::Http { url: url.to_owned(), message: "offline".to_owned() })
//!     }
//! }
//!
//! let mut config = Map::new();
//! let html = convert("# Hello\n\n## World\n", &mut config, &ConvertOptions::default(), &Offline)?;
//! assert!(html.contains(r##"<a href="#world">World</a>"##));
//! # Ok::<(), folio_renderer::RenderError>(())
//! ```

mod annotate;
mod convert;
mod error;
mod frontmatter;
pub mod markup;
mod remote;
mod renderer;
mod slug;
mod state;
mod toc;
mod tree;

pub use annotate::{annotate_code_blocks, composite_tag};
pub use convert::{ConvertOptions, convert, convert_to_markup};
pub use error::RenderError;
pub use frontmatter::{extract_frontmatter, merge_yaml, split_frontmatter};
pub use remote::{resolve_src_directive, transform_dialect};
pub use renderer::HtmlRenderer;
pub use slug::{Slugger, slugify};
pub use state::escape_html;
pub use toc::{TOC_MARKER, assign_anchor_ids, build_outline, insert_toc_heading};
pub use tree::{ContentTree, Heading};
