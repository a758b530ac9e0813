//! Markup tree: parse rendered HTML, edit it as elements, write it back.
//!
//! The tree keeps ElementTree-style `text`/`tail` strings so that inline
//! content round-trips exactly. Raw HTML embedded in markdown becomes real
//! nodes once the rendered document is parsed.

mod format;
mod parser;
mod serializer;
mod sink;
mod tree;

pub use format::format_tree;
pub use parser::{VOID_ELEMENTS, is_void, parse_fragment};
pub use serializer::{escape_attr, escape_text, serialize, serialize_children};
pub use tree::TreeNode;
