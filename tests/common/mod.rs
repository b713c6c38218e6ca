use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tagcache::cache::{CacheError, CacheTag, DistributedCache, EntryOptions, MemoryCache};

/// Two tags for isolation tests.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestTag {
    Users,
    Orders,
}

impl CacheTag for TestTag {
    fn name(&self) -> &str {
        match self {
            TestTag::Users => "Users",
            TestTag::Orders => "Orders",
        }
    }
}

/// Memory store that can be told to fail specific calls.
#[allow(dead_code)]
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryCache,
    failing_removes: Mutex<HashSet<String>>,
    fail_gets: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
    pub removes: AtomicUsize,
}

#[allow(dead_code)]
impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `remove` of `key` fails from now on.
    pub fn fail_remove_of(&self, key: &str) {
        self.failing_removes.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_gets(&self, fail: bool) {
        *self.fail_gets.lock().unwrap() = fail;
    }

    /// Every call sleeps this long before touching the store.
    pub fn delay_calls(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DistributedCache for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.pause().await;
        if *self.fail_gets.lock().unwrap() {
            return Err(CacheError::store("connection reset"));
        }
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<(), CacheError> {
        self.pause().await;
        self.inner.set(key, value, options).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.pause().await;
        self.removes.fetch_add(1, Ordering::SeqCst);
        if self.failing_removes.lock().unwrap().contains(key) {
            return Err(CacheError::store(format!("remove of {key} timed out")));
        }
        self.inner.remove(key).await
    }

    async fn refresh(&self, key: &str) -> Result<(), CacheError> {
        self.pause().await;
        self.inner.refresh(key).await
    }
}

/// Clock the test moves by hand.
#[allow(dead_code)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    /// Memory store reading time from this clock.
    pub fn store(self: &Arc<Self>) -> MemoryCache {
        let clock = Arc::clone(self);
        MemoryCache::new().with_clock(Arc::new(move || clock.now()))
    }
}
