//! Process-local store.
//!
//! Useful for tests and single-instance deployments. Entries honour the same
//! expiration policy as the Redis store.

use crate::{CacheError, DistributedCache, EntryOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Default interval between expiration scans.
pub const DEFAULT_SCAN_FREQUENCY: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    absolute: Option<DateTime<Utc>>,
    sliding: Option<chrono::Duration>,
    expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if let Some(window) = self.sliding {
            let slid = now
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.expires_at = Some(match self.absolute {
                Some(absolute) => absolute.min(slid),
                None => slid,
            });
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, MemoryEntry>,
    last_scan: Option<DateTime<Utc>>,
}

/// In-memory [`DistributedCache`].
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<Inner>>,
    clock: Clock,
    scan_frequency: chrono::Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("scan_frequency", &self.scan_frequency)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            clock: Arc::new(Utc::now),
            scan_frequency: to_chrono(DEFAULT_SCAN_FREQUENCY),
        }
    }

    /// Sets how often expired entries are swept out.
    pub fn with_scan_frequency(mut self, frequency: Duration) -> Self {
        self.scan_frequency = to_chrono(frequency);
        self
    }

    /// Replaces the wall clock, mainly for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes every expired entry now, returning how many were dropped.
    pub async fn compact(&self) -> usize {
        let now = (self.clock)();
        let mut inner = self.inner.write().await;
        sweep(&mut inner, now)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn maybe_scan(&self, inner: &mut Inner, now: DateTime<Utc>) {
        let due = match inner.last_scan {
            Some(last) => now - last >= self.scan_frequency,
            None => true,
        };
        if due {
            let swept = sweep(inner, now);
            if swept > 0 {
                debug!(cache.swept = swept, "Expired entries swept");
            }
        }
    }
}

fn sweep(inner: &mut Inner, now: DateTime<Utc>) -> usize {
    let before = inner.entries.len();
    inner.entries.retain(|_, entry| !entry.is_expired(now));
    inner.last_scan = Some(now);
    before - inner.entries.len()
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[async_trait]
impl DistributedCache for MemoryCache {
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.now();
        let mut inner = self.inner.write().await;
        self.maybe_scan(&mut inner, now);

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.remove(key);
        }
        Ok(None)
    }

    #[instrument(skip(self, value, options), fields(cache.operation = "SET"))]
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        let now = self.now();
        options.validate(now)?;

        let absolute = options.resolve_absolute(now);
        let sliding = options.sliding_expiration.map(to_chrono);
        let mut entry = MemoryEntry {
            value,
            absolute,
            sliding,
            expires_at: absolute,
        };
        entry.touch(now);

        let mut inner = self.inner.write().await;
        self.maybe_scan(&mut inner, now);
        inner.entries.insert(key.to_string(), entry);

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let now = self.now();
        let mut inner = self.inner.write().await;
        self.maybe_scan(&mut inner, now);
        inner.entries.remove(key);
        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "REFRESH"))]
    async fn refresh(&self, key: &str) -> Result<(), CacheError> {
        let now = self.now();
        let mut inner = self.inner.write().await;
        self.maybe_scan(&mut inner, now);
        if let Some(entry) = inner.entries.get_mut(key)
            && !entry.is_expired(now)
        {
            entry.touch(now);
        }
        Ok(())
    }
}
