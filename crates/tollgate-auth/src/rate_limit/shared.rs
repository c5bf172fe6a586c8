//! Fixed-window rate limiter backed by the shared cache.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use tollgate_cache::{CacheManager, keys};
use tollgate_core::traits::cache::CacheProvider;

use super::RateLimiter;

/// Counting window length. The TTL is armed when the window opens.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Counts requests per identity per minute in the shared cache.
///
/// Fails open: when the cache errors or does not answer within the
/// operation timeout, the request is admitted and a warning is logged.
#[derive(Debug, Clone)]
pub struct SharedRateLimiter {
    cache: CacheManager,
    limit: u64,
    op_timeout: Duration,
}

impl SharedRateLimiter {
    pub fn new(cache: CacheManager, requests_per_minute: u32, op_timeout: Duration) -> Self {
        Self {
            cache,
            limit: u64::from(requests_per_minute),
            op_timeout,
        }
    }
}

#[async_trait]
impl RateLimiter for SharedRateLimiter {
    async fn admit(&self, identity: &str) -> bool {
        let key = keys::rate_limit(identity);
        let step = self.cache.incr_capped(&key, self.limit, WINDOW);

        match tokio::time::timeout(self.op_timeout, step).await {
            Ok(Ok(observed)) => observed < self.limit,
            Ok(Err(e)) => {
                warn!(identity, error = %e, "Rate-limit counter unavailable, admitting request");
                true
            }
            Err(_) => {
                warn!(identity, "Rate-limit counter timed out, admitting request");
                true
            }
        }
    }
}
