//! Request throttling for the authentication endpoints.
//!
//! Two interchangeable backends sit behind [`RateLimiter`]: a per-process
//! token bucket and a fixed-window counter kept in the shared cache.

pub mod memory;
pub mod shared;
pub mod sweeper;

use std::time::Duration;

use async_trait::async_trait;

use tollgate_cache::CacheManager;
use tollgate_core::config::{RateLimitBackend, RateLimitConfig};

pub use memory::MemoryRateLimiter;
pub use shared::SharedRateLimiter;
pub use sweeper::RateLimitSweeper;

/// Admission decision for one request from one client identity.
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    /// Returns `true` if the request may proceed.
    async fn admit(&self, identity: &str) -> bool;
}

/// Dispatcher between limiter backends.
///
/// Selected once at startup based on configuration.
#[derive(Debug, Clone)]
pub enum RateLimiterDispatch {
    /// In-process token bucket (single node).
    Memory(MemoryRateLimiter),
    /// Fixed window in the shared cache (multi-node).
    Shared(SharedRateLimiter),
}

impl RateLimiterDispatch {
    /// Build the configured backend.
    pub fn from_config(config: &RateLimitConfig, cache: CacheManager, op_timeout: Duration) -> Self {
        match config.backend {
            RateLimitBackend::Memory => Self::Memory(MemoryRateLimiter::new(
                config.requests_per_minute,
                Duration::from_secs(config.stale_after_seconds),
            )),
            RateLimitBackend::Shared => Self::Shared(SharedRateLimiter::new(
                cache,
                config.requests_per_minute,
                op_timeout,
            )),
        }
    }

    /// The in-process limiter, when that backend is active.
    pub fn as_memory(&self) -> Option<&MemoryRateLimiter> {
        match self {
            Self::Memory(inner) => Some(inner),
            Self::Shared(_) => None,
        }
    }
}

#[async_trait]
impl RateLimiter for RateLimiterDispatch {
    async fn admit(&self, identity: &str) -> bool {
        match self {
            Self::Memory(inner) => inner.admit(identity).await,
            Self::Shared(inner) => inner.admit(identity).await,
        }
    }
}
