//! Redis-backed store for distributed caching.
//!
//! Each entry is a Redis hash:
//!
//! - `data`: the stored bytes
//! - `absexp`: absolute deadline as unix milliseconds (optional)
//! - `sldexp`: sliding window in milliseconds (optional)
//!
//! The key's Redis TTL always tracks the nearer deadline, so Redis itself
//! evicts expired entries.

use crate::{CacheError, DistributedCache, EntryOptions};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, instrument};

const DATA_FIELD: &str = "data";
const ABSOLUTE_FIELD: &str = "absexp";
const SLIDING_FIELD: &str = "sldexp";

/// Redis store client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if connection fails.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }

    /// Round-trips a PING to the server.
    #[instrument(skip(self), fields(cache.operation = "PING"))]
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Re-arms the TTL of a sliding entry. Returns without touching keys
    /// that have no sliding window.
    async fn slide(
        &self,
        conn: &mut ConnectionManager,
        key: &str,
        absolute_ms: Option<i64>,
        sliding_ms: Option<i64>,
    ) -> Result<(), CacheError> {
        let Some(window) = sliding_ms else {
            return Ok(());
        };

        let now = Utc::now().timestamp_millis();
        let ttl = match absolute_ms {
            Some(deadline) => (deadline - now).min(window),
            None => window,
        };

        if ttl > 0 {
            conn.pexpire::<_, ()>(key, ttl).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl DistributedCache for RedisCache {
    #[instrument(skip(self), fields(cache.operation = "HMGET"))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();

        let (absolute_ms, sliding_ms, data): (Option<i64>, Option<i64>, Option<Vec<u8>>) =
            redis::cmd("HMGET")
                .arg(key)
                .arg(ABSOLUTE_FIELD)
                .arg(SLIDING_FIELD)
                .arg(DATA_FIELD)
                .query_async(&mut conn)
                .await?;

        match data {
            Some(bytes) => {
                debug!(cache.key = %key, "Cache hit");
                self.slide(&mut conn, key, absolute_ms, sliding_ms).await?;
                Ok(Some(bytes))
            }
            None => {
                debug!(cache.key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value, options), fields(cache.operation = "HSET"))]
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        let now = Utc::now();
        options.validate(now)?;

        let absolute_ms = options
            .resolve_absolute(now)
            .map(|deadline| deadline.timestamp_millis());
        let sliding_ms = options
            .sliding_expiration
            .map(|window| i64::try_from(window.as_millis()).unwrap_or(i64::MAX));

        let mut hset = redis::cmd("HSET");
        hset.arg(key).arg(DATA_FIELD).arg(value);
        if let Some(deadline) = absolute_ms {
            hset.arg(ABSOLUTE_FIELD).arg(deadline);
        }
        if let Some(window) = sliding_ms {
            hset.arg(SLIDING_FIELD).arg(window);
        }

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore().add_command(hset).ignore();

        let ttl_ms = match (absolute_ms, sliding_ms) {
            (Some(deadline), Some(window)) => Some((deadline - now.timestamp_millis()).min(window)),
            (Some(deadline), None) => Some(deadline - now.timestamp_millis()),
            (None, window) => window,
        };
        if let Some(ttl) = ttl_ms {
            pipe.pexpire(key, ttl.max(1)).ignore();
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;

        debug!(cache.key = %key, cache.ttl_ms = ?ttl_ms, "Cache set");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(key).await?;

        debug!(cache.key = %key, "Cache invalidated");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "REFRESH"))]
    async fn refresh(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        let (absolute_ms, sliding_ms): (Option<i64>, Option<i64>) = redis::cmd("HMGET")
            .arg(key)
            .arg(ABSOLUTE_FIELD)
            .arg(SLIDING_FIELD)
            .query_async(&mut conn)
            .await?;

        self.slide(&mut conn, key, absolute_ms, sliding_ms).await
    }
}
