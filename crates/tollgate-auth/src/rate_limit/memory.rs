//! In-process token bucket rate limiter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::RateLimiter;

/// Bucket state of one client identity.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    /// Fractional tokens left.
    pub available_tokens: f64,
    /// Last time the bucket was refilled (and last time the client was seen).
    pub last_refill: Instant,
}

/// Token bucket with capacity `requests_per_minute`, refilled continuously.
///
/// A first-seen identity is admitted and left with `capacity - 1` tokens.
/// A request is rejected when less than one whole token is available.
#[derive(Debug, Clone)]
pub struct MemoryRateLimiter {
    /// Identity → bucket state. No I/O happens while this is locked.
    buckets: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    capacity: f64,
    stale_after: Duration,
}

impl MemoryRateLimiter {
    pub fn new(requests_per_minute: u32, stale_after: Duration) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            capacity: f64::from(requests_per_minute),
            stale_after,
        }
    }

    /// Admission decision as of `now`.
    pub async fn admit_at(&self, identity: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().await;

        let Some(bucket) = buckets.get_mut(identity) else {
            buckets.insert(
                identity.to_string(),
                RateLimitEntry {
                    available_tokens: self.capacity - 1.0,
                    last_refill: now,
                },
            );
            return true;
        };

        let elapsed_minutes = now.saturating_duration_since(bucket.last_refill).as_secs_f64() / 60.0;
        bucket.available_tokens =
            (bucket.available_tokens + elapsed_minutes * self.capacity).min(self.capacity);
        bucket.last_refill = now;

        if bucket.available_tokens < 1.0 {
            false
        } else {
            bucket.available_tokens -= 1.0;
            true
        }
    }

    /// Drop identities idle for longer than the stale threshold.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep_stale(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= self.stale_after);
        let removed = before - buckets.len();
        if removed > 0 {
            debug!(removed, remaining = buckets.len(), "Swept idle rate-limit buckets");
        }
        removed
    }

    /// Number of tracked identities.
    pub async fn len(&self) -> usize {
        self.buckets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn admit(&self, identity: &str) -> bool {
        self.admit_at(identity, Instant::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_reject() {
        let limiter = MemoryRateLimiter::new(5, STALE);
        for _ in 0..5 {
            assert!(limiter.admit("1.2.3.4").await);
        }
        assert!(!limiter.admit("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_capacity_after_one_minute() {
        let limiter = MemoryRateLimiter::new(5, STALE);
        for _ in 0..6 {
            limiter.admit("1.2.3.4").await;
        }
        tokio::time::advance(Duration::from_secs(60)).await;
        for _ in 0..5 {
            assert!(limiter.admit("1.2.3.4").await);
        }
        assert!(!limiter.admit("1.2.3.4").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_refill_admits_one() {
        let limiter = MemoryRateLimiter::new(60, STALE);
        for _ in 0..60 {
            assert!(limiter.admit("k").await);
        }
        assert!(!limiter.admit("k").await);
        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(limiter.admit("k").await);
        assert!(!limiter.admit("k").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identities_are_independent() {
        let limiter = MemoryRateLimiter::new(1, STALE);
        assert!(limiter.admit("a").await);
        assert!(!limiter.admit("a").await);
        assert!(limiter.admit("b").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_idle_only() {
        let limiter = MemoryRateLimiter::new(10, Duration::from_secs(120));
        let start = Instant::now();
        limiter.admit_at("old", start).await;
        limiter
            .admit_at("fresh", start + Duration::from_secs(100))
            .await;

        let removed = limiter.sweep_stale(start + Duration::from_secs(150)).await;
        assert_eq!(removed, 1);
        assert_eq!(limiter.len().await, 1);
    }
}
