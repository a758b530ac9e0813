//! Page materialization and site building for Folio.
//!
//! [`SiteBuilder`] drives a build: it scans the source tree, copies
//! assets and base pages (minified unless `[assets] minify` is off), then
//! materializes every document on the rayon pool. Per document,
//! [`materialize`] runs the conversion pipeline, the snippet processor
//! and the page partitioning, and [`write_output`] writes the resulting
//! triple.

mod builder;
mod minify;
mod output;
mod page;
mod page_config;
mod scanner;
pub mod snippet;

pub use builder::{BuildError, BuildReport, SiteBuilder};
pub use minify::{MinifyError, minify_asset, minify_page, minify_script, minify_stylesheet};
pub use output::write_output;
pub use page::{BookPosition, MaterializeContext, PageError, PageJob, PageOutput, materialize};
pub use page_config::PageConfig;
pub use scanner::{BASE_PAGE, Scanner, SourceTree};
pub use snippet::{Highlighter, SnippetError, SnippetProcessor};
