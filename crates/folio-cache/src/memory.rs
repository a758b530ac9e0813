//! In-memory cache scoped to one build run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::{Cache, CacheBucket};

type Entries = Arc<RwLock<HashMap<String, Vec<u8>>>>;

/// Unbounded in-memory [`Cache`].
///
/// Entries only grow. Concurrent misses on the same key may both compute
/// and store a value; the last `set` wins. Every write is a single insert,
/// so a lock poisoned by a panicking holder is used as is.
#[derive(Default)]
pub struct MemoryCache {
    buckets: Mutex<HashMap<String, Entries>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = Arc::clone(buckets.entry(name.to_owned()).or_insert_with(|| {
            tracing::debug!(bucket = name, "Created memory cache bucket");
            Entries::default()
        }));
        Box::new(MemoryCacheBucket { entries })
    }
}

/// Handle to one bucket of a [`MemoryCache`].
struct MemoryCacheBucket {
    entries: Entries,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &[u8]) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_vec());
    }
}
