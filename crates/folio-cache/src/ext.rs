//! Typed convenience methods for [`CacheBucket`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed access on top of the raw byte API.
///
/// Kept as an extension trait so [`CacheBucket`] stays object-safe and
/// free of serde.
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value. Misses and decode failures are `None`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Store a value as JSON. Serialization failures are skipped.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.set(key, &bytes);
        }
    }

    /// Retrieve a cached UTF-8 string. Misses and invalid UTF-8 are `None`.
    fn get_string(&self, key: &str) -> Option<String> {
        let bytes = self.get(key)?;
        String::from_utf8(bytes).ok()
    }

    /// Store a string value.
    fn set_string(&self, key: &str, value: &str) {
        self.set(key, value.as_bytes());
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
