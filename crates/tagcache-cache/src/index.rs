//! Tag index records.
//!
//! For every tag the store holds one record under [`index_key`] listing the
//! entry keys written under that tag. Records are JSON arrays of strings and
//! are written without expiration, so they stay authoritative until the tag
//! is drained.
//!
//! Updates are read-modify-write against the store with no version check:
//! two callers mutating the same tag concurrently can lose one update (last
//! writer wins on the whole record). [`TagIndex::with_local_locks`] serialises
//! mutations issued through one `TagIndex` value, which closes the race inside
//! a single process but not between processes sharing the store.

use crate::keys::index_key;
use crate::tag::CacheTag;
use crate::{CacheError, DistributedCache, EntryOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

type LockTable = Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Maintains the per-tag member lists in the underlying store.
#[derive(Clone)]
pub struct TagIndex<S> {
    store: S,
    locks: Option<LockTable>,
}

impl<S> std::fmt::Debug for TagIndex<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagIndex")
            .field("local_locks", &self.locks.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: DistributedCache> TagIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store, locks: None }
    }

    /// Serialises index mutations per tag within this process.
    pub fn with_local_locks(mut self) -> Self {
        self.locks = Some(Arc::new(Mutex::new(HashMap::new())));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current members of `tag`. Missing or unreadable records are empty.
    #[instrument(skip(self, tag), fields(cache.tag = %tag.name()))]
    pub async fn members<T: CacheTag + ?Sized>(&self, tag: &T) -> Result<Vec<String>, CacheError> {
        self.read(&index_key(tag)).await
    }

    /// Records `key` as a member of `tag`. Returns `false` when it already was.
    #[instrument(skip(self, tag), fields(cache.tag = %tag.name()))]
    pub async fn add_member<T: CacheTag + ?Sized>(
        &self,
        tag: &T,
        key: &str,
    ) -> Result<bool, CacheError> {
        let index_key = index_key(tag);
        let _guard = self.lock(&index_key).await;

        let mut members = self.read(&index_key).await?;
        if members.iter().any(|member| member == key) {
            return Ok(false);
        }

        members.push(key.to_string());
        self.write(&index_key, &members).await?;

        debug!(cache.key = %key, cache.members = members.len(), "Index member added");
        Ok(true)
    }

    /// Drops `key` from `tag`. Returns `false` when it was not a member.
    ///
    /// Removing the last member leaves an empty record in place.
    #[instrument(skip(self, tag), fields(cache.tag = %tag.name()))]
    pub async fn remove_member<T: CacheTag + ?Sized>(
        &self,
        tag: &T,
        key: &str,
    ) -> Result<bool, CacheError> {
        let index_key = index_key(tag);
        let _guard = self.lock(&index_key).await;

        let mut members = self.read(&index_key).await?;
        let before = members.len();
        members.retain(|member| member != key);
        if members.len() == before {
            return Ok(false);
        }

        self.write(&index_key, &members).await?;

        debug!(cache.key = %key, cache.members = members.len(), "Index member removed");
        Ok(true)
    }

    /// Removes every member entry of `tag`, then the record itself.
    ///
    /// Stops at the first store failure: entries already removed stay
    /// removed and the record is left in place.
    #[instrument(skip(self, tag), fields(cache.tag = %tag.name()))]
    pub async fn drain_and_clear<T: CacheTag + ?Sized>(
        &self,
        tag: &T,
    ) -> Result<usize, CacheError> {
        let index_key = index_key(tag);
        let _guard = self.lock(&index_key).await;

        let members = self.read(&index_key).await?;
        for member in &members {
            self.store.remove(member).await?;
        }
        self.store.remove(&index_key).await?;

        debug!(cache.removed = members.len(), "Tag drained");
        Ok(members.len())
    }

    async fn read(&self, index_key: &str) -> Result<Vec<String>, CacheError> {
        let Some(bytes) = self.store.get(index_key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_slice(&bytes) {
            Ok(members) => Ok(members),
            Err(e) => {
                warn!(
                    cache.key = %index_key,
                    error = %e,
                    "Unreadable tag index, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, index_key: &str, members: &[String]) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(members)?;
        self.store.set(index_key, bytes, &EntryOptions::none()).await
    }

    async fn lock(&self, index_key: &str) -> Option<OwnedMutexGuard<()>> {
        let locks = self.locks.as_ref()?;
        let lock = {
            let mut table = locks.lock().await;
            Arc::clone(table.entry(index_key.to_string()).or_default())
        };
        Some(lock.lock_owned().await)
    }
}
