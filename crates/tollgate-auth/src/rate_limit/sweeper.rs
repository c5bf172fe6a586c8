//! Periodic removal of idle token buckets.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;

use super::memory::MemoryRateLimiter;

/// Background task that sweeps the in-process limiter until shutdown.
#[derive(Debug, Clone)]
pub struct RateLimitSweeper {
    limiter: MemoryRateLimiter,
    interval: Duration,
}

impl RateLimitSweeper {
    pub fn new(limiter: MemoryRateLimiter, interval: Duration) -> Self {
        Self { limiter, interval }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Rate-limit sweeper started");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.limiter.sweep_stale(Instant::now()).await;
                }
            }
        }

        info!("Rate-limit sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_tick_and_stops() {
        let limiter = MemoryRateLimiter::new(10, Duration::from_secs(30));
        limiter.admit_at("idle", Instant::now()).await;

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(RateLimitSweeper::new(limiter.clone(), Duration::from_secs(60)).run(rx));

        time::sleep(Duration::from_secs(61)).await;
        assert!(limiter.is_empty().await);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
