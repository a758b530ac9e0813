//! Remote content fetching for Folio.
//!
//! [`RemoteFetcher`] resolves a URL to text. URLs under the configured
//! repository base are read from a local mirror checkout first; everything
//! else, and every mirror miss, goes over HTTP. Results are memoized in a
//! [`folio_cache::Cache`] bucket for the rest of the run.
//!
//! [`wait_for_json`] is the one polling helper: it waits, with a bounded
//! timeout, for a sibling document's config file to appear.

mod error;
mod fetcher;
mod wait;

pub use error::FetchError;
pub use fetcher::{RemoteFetcher, create_agent};
pub use wait::wait_for_json;

/// Source of remote text content.
///
/// Implemented by [`RemoteFetcher`]; tests substitute in-memory fakes.
pub trait Fetch: Send + Sync {
    /// Fetch the text behind `url`.
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
