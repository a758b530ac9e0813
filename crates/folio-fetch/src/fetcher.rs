use std::path::PathBuf;
use std::time::Duration;

use folio_cache::{Cache, CacheBucket, CacheBucketExt};
use ureq::Agent;

use crate::{Fetch, FetchError};

/// Cache bucket holding fetched text keyed by exact URL.
const REMOTE_BUCKET: &str = "remote";

/// Create HTTP agent with the specified timeout.
///
/// Status codes are inspected by the caller, so they are not turned into
/// transport errors.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Mirror-first, memoizing [`Fetch`] implementation.
pub struct RemoteFetcher {
    agent: Agent,
    repo_base: String,
    mirror_dir: Option<PathBuf>,
    cache: Box<dyn CacheBucket>,
}

impl RemoteFetcher {
    /// Create a fetcher.
    ///
    /// # Arguments
    ///
    /// * `repo_base` - URL prefix served by `mirror_dir` (empty disables the mirror)
    /// * `mirror_dir` - Local checkout whose layout matches `repo_base`
    /// * `timeout` - Global timeout per HTTP request
    /// * `cache` - Run-scoped cache; the `remote` bucket is used
    pub fn new(
        repo_base: impl Into<String>,
        mirror_dir: Option<PathBuf>,
        timeout: Duration,
        cache: &dyn Cache,
    ) -> Self {
        Self {
            agent: create_agent(timeout),
            repo_base: repo_base.into(),
            mirror_dir,
            cache: cache.bucket(REMOTE_BUCKET),
        }
    }

    /// Local path mirroring `url`, if `url` lives under the repository base.
    fn mirror_path(&self, url: &str) -> Option<PathBuf> {
        if self.repo_base.is_empty() {
            return None;
        }
        let rest = url.strip_prefix(&self.repo_base)?;
        Some(self.mirror_dir.as_ref()?.join(rest))
    }

    fn read_mirror(&self, url: &str) -> Option<String> {
        let path = self.mirror_path(url)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!(url, path = %path.display(), "Read from local mirror");
                Some(text)
            }
            Err(e) => {
                tracing::debug!(url, path = %path.display(), error = %e, "Mirror miss");
                None
            }
        }
    }

    fn download(&self, url: &str) -> Result<String, FetchError> {
        tracing::info!(url, "Downloading");

        let response = self.agent.get(url).call().map_err(|e| FetchError::Http {
            url: url.to_owned(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status,
            });
        }

        response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Body {
                url: url.to_owned(),
                message: e.to_string(),
            })
    }
}

impl Fetch for RemoteFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(text) = self.cache.get_string(url) {
            return Ok(text);
        }

        let text = match self.read_mirror(url) {
            Some(text) => text,
            None => self.download(url)?,
        };

        self.cache.set_string(url, &text);
        Ok(text)
    }
}
