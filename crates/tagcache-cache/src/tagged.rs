//! Tag-aware read-through cache.
//!
//! [`TaggedCache`] derives entry keys from a tag plus parameters, stores
//! values through a [`Codec`], and keeps the tag's index record in step so
//! the whole tag can be invalidated at once.

use crate::codec::{Codec, JsonCodec};
use crate::index::TagIndex;
use crate::keys::derive_key;
use crate::tag::CacheTag;
use crate::{CacheError, DistributedCache, EntryOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, instrument};

/// Tagged read-through cache over any [`DistributedCache`].
///
/// Entry writes and index updates are two sequential store calls, not a
/// transaction. Concurrent misses for the same key each run their producer.
///
/// # Example
///
/// ```ignore
/// let cache = TaggedCache::new(MemoryCache::new());
///
/// let value: String = cache
///     .get_or_populate(&Tag::Values, Some(&json!({ "id": 5 })), &options, || async {
///         "value".to_string()
///     })
///     .await?;
///
/// cache.remove_tag(&Tag::Values).await?;
/// ```
#[derive(Clone, Debug)]
pub struct TaggedCache<S, C = JsonCodec> {
    index: TagIndex<S>,
    codec: C,
    default_options: EntryOptions,
}

impl<S: DistributedCache> TaggedCache<S> {
    pub fn new(store: S) -> Self {
        Self::from_index(TagIndex::new(store))
    }

    pub fn from_index(index: TagIndex<S>) -> Self {
        Self {
            index,
            codec: JsonCodec,
            default_options: EntryOptions::none(),
        }
    }
}

impl<S: DistributedCache, C: Codec> TaggedCache<S, C> {
    /// Swaps the value encoding.
    pub fn with_codec<D: Codec>(self, codec: D) -> TaggedCache<S, D> {
        TaggedCache {
            index: self.index,
            codec,
            default_options: self.default_options,
        }
    }

    /// Options used by [`TaggedCache::get_or_populate_default`].
    pub fn with_default_options(mut self, options: EntryOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn default_options(&self) -> &EntryOptions {
        &self.default_options
    }

    pub fn index(&self) -> &TagIndex<S> {
        &self.index
    }

    pub fn store(&self) -> &S {
        self.index.store()
    }

    /// Entry key for `tag` and `parameters`.
    pub fn key_for<T, P>(&self, tag: &T, parameters: Option<&P>) -> Result<String, CacheError>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
    {
        derive_key(tag, parameters)
    }

    /// Reads the value stored for `tag` and `parameters`.
    ///
    /// Returns `Ok(None)` on a miss; bytes that do not decode as `V` are an
    /// error.
    #[instrument(skip_all, fields(cache.tag = %tag.name()))]
    pub async fn get<T, P, V>(
        &self,
        tag: &T,
        parameters: Option<&P>,
    ) -> Result<Option<V>, CacheError>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        let key = derive_key(tag, parameters)?;
        let bytes = self.store().get(&key).await?;
        self.codec.decode_opt(bytes.as_deref())
    }

    /// Returns the cached value, or runs `producer` once on a miss and
    /// stores its result with `options`.
    #[instrument(skip_all, fields(cache.tag = %tag.name()))]
    pub async fn get_or_populate<T, P, V, F, Fut>(
        &self,
        tag: &T,
        parameters: Option<&P>,
        options: &EntryOptions,
        producer: F,
    ) -> Result<V, CacheError>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.try_get_or_populate(tag, parameters, options, move || async move {
            Ok::<_, CacheError>(producer().await)
        })
        .await
    }

    /// [`TaggedCache::get_or_populate`] with the configured default options.
    pub async fn get_or_populate_default<T, P, V, F, Fut>(
        &self,
        tag: &T,
        parameters: Option<&P>,
        producer: F,
    ) -> Result<V, CacheError>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.get_or_populate(tag, parameters, &self.default_options, producer)
            .await
    }

    /// Read-through with a fallible producer. A producer error is returned
    /// as-is and nothing is stored.
    #[instrument(skip_all, fields(cache.tag = %tag.name()))]
    pub async fn try_get_or_populate<T, P, V, E, F, Fut>(
        &self,
        tag: &T,
        parameters: Option<&P>,
        options: &EntryOptions,
        producer: F,
    ) -> Result<V, E>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = derive_key(tag, parameters)?;

        let bytes = self.store().get(&key).await?;
        if let Some(value) = self.codec.decode_opt(bytes.as_deref())? {
            debug!(cache.key = %key, "Read-through hit");
            return Ok(value);
        }

        debug!(cache.key = %key, "Read-through miss, populating");
        let value = producer().await?;
        self.write(tag, &key, &value, options).await?;

        Ok(value)
    }

    /// Stores `value` for `tag` and `parameters` and records the key in the
    /// tag's index.
    #[instrument(skip_all, fields(cache.tag = %tag.name()))]
    pub async fn set<T, P, V>(
        &self,
        tag: &T,
        parameters: Option<&P>,
        value: &V,
        options: &EntryOptions,
    ) -> Result<(), CacheError>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let key = derive_key(tag, parameters)?;
        self.write(tag, &key, value, options).await
    }

    /// Removes the entry for `tag` and `parameters` and drops it from the
    /// index. Removing a missing entry is a no-op.
    #[instrument(skip_all, fields(cache.tag = %tag.name()))]
    pub async fn remove<T, P>(&self, tag: &T, parameters: Option<&P>) -> Result<(), CacheError>
    where
        T: CacheTag + ?Sized,
        P: Serialize + ?Sized,
    {
        let key = derive_key(tag, parameters)?;
        self.store().remove(&key).await?;
        self.index.remove_member(tag, &key).await?;
        Ok(())
    }

    /// Removes every entry written under `tag` along with its index record.
    /// Returns the number of entries removed.
    #[instrument(skip_all, fields(cache.tag = %tag.name()))]
    pub async fn remove_tag<T>(&self, tag: &T) -> Result<usize, CacheError>
    where
        T: CacheTag + ?Sized,
    {
        self.index.drain_and_clear(tag).await
    }

    /// [`TaggedCache::remove_tag`] for each tag in turn. An empty slice is a
    /// no-op.
    pub async fn remove_tags<T>(&self, tags: &[T]) -> Result<usize, CacheError>
    where
        T: CacheTag,
    {
        let mut removed = 0;
        for tag in tags {
            removed += self.remove_tag(tag).await?;
        }
        Ok(removed)
    }

    /// Keys currently recorded under `tag`.
    pub async fn members<T>(&self, tag: &T) -> Result<Vec<String>, CacheError>
    where
        T: CacheTag + ?Sized,
    {
        self.index.members(tag).await
    }

    async fn write<T, V>(
        &self,
        tag: &T,
        key: &str,
        value: &V,
        options: &EntryOptions,
    ) -> Result<(), CacheError>
    where
        T: CacheTag + ?Sized,
        V: Serialize + ?Sized,
    {
        let bytes = self.codec.encode(value)?;
        self.store().set(key, bytes, options).await?;
        self.index.add_member(tag, key).await?;
        Ok(())
    }
}
