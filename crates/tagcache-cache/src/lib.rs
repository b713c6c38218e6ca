//! # Tagcache Cache
//!
//! Tag-indexed caching over a distributed key/value store.
//!
//! This crate provides:
//! - Deterministic entry keys derived from a tag and parameters
//! - Per-tag index records so a whole tag can be invalidated in one call
//! - A read-through façade ([`TaggedCache`]) over any [`DistributedCache`]
//! - Redis and in-memory stores
//! - Cache configuration from environment variables
//!
//! # Example
//!
//! ```ignore
//! use tagcache_cache::{CacheConfig, EntryOptions, RedisCache, Tag, TaggedCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tagcache_cache::CacheError> {
//!     let config = CacheConfig::from_env();
//!     let cache = TaggedCache::new(RedisCache::new(&config.redis_url).await?);
//!
//!     let options = config.default_entry_options();
//!     let value: String = cache
//!         .get_or_populate(&Tag::Values, Some(&json!({ "id": 5 })), &options, || async {
//!             "value".to_string()
//!         })
//!         .await?;
//!
//!     // Drop everything cached under the tag
//!     cache.remove_tag(&Tag::Values).await?;
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod keys;
pub mod memory;
pub mod options;
pub mod redis;
pub mod store;
pub mod tag;
pub mod tagged;

pub use cancel::with_cancellation;
pub use codec::{Codec, JsonCodec};
pub use config::CacheConfig;
pub use error::CacheError;
pub use index::TagIndex;
pub use keys::{INDEX_KEY_PREFIX, derive_key, index_key};
pub use memory::MemoryCache;
pub use options::EntryOptions;
pub use self::redis::RedisCache;
pub use store::DistributedCache;
pub use tag::{CacheTag, Tag, UnknownTag};
pub use tagged::TaggedCache;
pub use tokio_util::sync::CancellationToken;
