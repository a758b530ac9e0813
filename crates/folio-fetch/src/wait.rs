use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::FetchError;

/// Wait for `path` to hold parsable JSON and return it.
///
/// Re-reads the file every `interval`. A missing file keeps waiting; a
/// malformed one is logged and retried, since the writer may not have
/// finished yet. Fails with [`FetchError::WaitTimeout`] once `timeout` has
/// elapsed.
pub fn wait_for_json(
    path: &Path,
    interval: Duration,
    timeout: Duration,
) -> Result<serde_json::Value, FetchError> {
    let start = Instant::now();
    loop {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read JSON, retrying");
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read file, retrying");
            }
        }

        let waited = start.elapsed();
        if waited >= timeout {
            return Err(FetchError::WaitTimeout {
                path: path.to_path_buf(),
                waited,
            });
        }
        std::thread::sleep(interval.min(timeout - waited));
    }
}
