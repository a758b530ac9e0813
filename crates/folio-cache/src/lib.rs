//! Cache abstraction layer for Folio.
//!
//! Two traits decouple cache consumers from storage:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`MemoryCache`]: In-process store that lives as long as one build run
//!
//! Nothing is ever evicted or persisted. A build creates a fresh
//! [`MemoryCache`] and drops it when the run ends.
//!
//! # Example
//!
//! ```
//! use folio_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let bucket = cache.bucket("remote");
//! bucket.set("https://example.com/a.md", b"# A");
//! assert_eq!(bucket.get("https://example.com/a.md"), Some(b"# A".to_vec()));
//! ```

mod ext;
mod memory;

pub use ext::CacheBucketExt;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value, `None` on miss.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value, overwriting any existing entry for the same key.
    fn set(&self, key: &str, value: &[u8]);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Buckets are logically isolated from each other. Calling `bucket` twice
/// with the same name returns handles that share the same storage.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket (e.g. "remote", "books").
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Every fetch goes to the mirror or the network when used.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let cache = NullCache;
        let bucket = cache.bucket("remote");

        assert_eq!(bucket.get("key"), None);

        bucket.set("key", b"hello");
        assert_eq!(bucket.get("key"), None);
    }
}
