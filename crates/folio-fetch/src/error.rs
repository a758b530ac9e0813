use std::path::PathBuf;
use std::time::Duration;

/// Error returned by [`crate::Fetch`] implementations and [`crate::wait_for_json`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("failed to fetch {url}: {message}")]
    Http { url: String, message: String },
    /// Server answered with an error status.
    #[error("failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    /// Response body could not be read as text.
    #[error("failed to read response from {url}: {message}")]
    Body { url: String, message: String },
    /// The awaited file never became readable JSON.
    #[error("gave up after {waited:?} waiting for {}", .path.display())]
    WaitTimeout { path: PathBuf, waited: Duration },
}
