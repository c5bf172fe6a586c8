//! In-memory cache implementation using the moka crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant as StdInstant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use tokio::time::Instant;
use tracing::debug;

use tollgate_core::config::cache::MemoryCacheConfig;
use tollgate_core::result::AppResult;
use tollgate_core::traits::cache::CacheProvider;

/// Minimum spacing between two sweeps of the counter map.
const PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// Marker for "never pruned".
const NEVER: u64 = u64::MAX;

/// A cached string together with the TTL it was written with.
#[derive(Debug, Clone)]
struct TimedValue {
    value: String,
    ttl: Duration,
}

/// Per-entry expiry policy: every write carries its own TTL.
struct PerEntryTtl;

impl Expiry<String, TimedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &TimedValue,
        _created_at: StdInstant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TimedValue,
        _updated_at: StdInstant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// One fixed counting window.
#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u64,
    opened_at: Instant,
    window: Duration,
}

impl WindowCounter {
    fn is_closed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.opened_at) >= self.window
    }
}

/// In-memory cache provider using moka.
///
/// Window counters live in a separate map keyed like the cache so that
/// [`CacheProvider::incr_capped`] is atomic per key (the dashmap shard
/// lock is held for the whole read-compare-increment).
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, TimedValue>,
    counters: Arc<DashMap<String, WindowCounter>>,
    max_counters: usize,
    epoch: Instant,
    last_prune_ms: Arc<AtomicU64>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            counters: Arc::new(DashMap::new()),
            max_counters: usize::try_from(config.max_capacity).unwrap_or(usize::MAX),
            epoch: Instant::now(),
            last_prune_ms: Arc::new(AtomicU64::new(NEVER)),
        }
    }

    /// Claims the next sweep slot. At most one caller wins per [`PRUNE_INTERVAL`].
    fn prune_due(&self, now: Instant) -> bool {
        let now_ms = u64::try_from(now.saturating_duration_since(self.epoch).as_millis())
            .unwrap_or(NEVER - 1);
        let last = self.last_prune_ms.load(Ordering::Acquire);
        if last != NEVER && Duration::from_millis(now_ms.saturating_sub(last)) < PRUNE_INTERVAL {
            return false;
        }
        self.last_prune_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn prune_closed_windows(&self, now: Instant) {
        let before = self.counters.len();
        self.counters.retain(|_, counter| !counter.is_closed(now));
        let removed = before.saturating_sub(self.counters.len());
        if removed > 0 {
            debug!(removed, "Pruned closed rate-limit windows");
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(
                key.to_string(),
                TimedValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.counters.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.remove(key).await.map(|entry| entry.value))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn incr_capped(&self, key: &str, cap: u64, window: Duration) -> AppResult<u64> {
        let now = Instant::now();
        let observed = {
            let mut counter = self
                .counters
                .entry(key.to_string())
                .or_insert(WindowCounter {
                    count: 0,
                    opened_at: now,
                    window,
                });
            if counter.is_closed(now) {
                *counter = WindowCounter {
                    count: 0,
                    opened_at: now,
                    window,
                };
            }
            let observed = counter.count;
            if observed < cap {
                counter.count += 1;
            }
            observed
        };

        if self.counters.len() > self.max_counters && self.prune_due(now) {
            self.prune_closed_windows(now);
        }

        Ok(observed)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
