//! The key/value store contract every backend implements.

use crate::{CacheError, EntryOptions};
use async_trait::async_trait;
use std::sync::Arc;

/// A shared byte-blob store addressed by string keys.
///
/// Implementations own storage, eviction and transport. Every call is a
/// suspension point; dropping the returned future abandons the call.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Returns the stored bytes, or `None` when the key is absent or expired.
    ///
    /// Reading an entry with a sliding expiration re-arms its window.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: Vec<u8>, options: &EntryOptions)
    -> Result<(), CacheError>;

    /// Deletes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Re-arms the sliding window of `key` without reading it.
    async fn refresh(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl<S: DistributedCache + ?Sized> DistributedCache for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        (**self).set(key, value, options).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key).await
    }

    async fn refresh(&self, key: &str) -> Result<(), CacheError> {
        (**self).refresh(key).await
    }
}
