//! Request throttling configuration.

use serde::{Deserialize, Serialize};

/// Which rate limiter backs the auth endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitBackend {
    /// Per-process token bucket.
    Memory,
    /// Fixed-window counter in the shared cache.
    Shared,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the auth endpoints are throttled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Limiter backend.
    #[serde(default = "default_backend")]
    pub backend: RateLimitBackend,
    /// Allowed requests per client identity per minute.
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    /// How often the memory backend sweeps idle identities, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Idle time after which an identity's bucket is dropped, in seconds.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: default_backend(),
            requests_per_minute: default_rpm(),
            sweep_interval_seconds: default_sweep_interval(),
            stale_after_seconds: default_stale_after(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_backend() -> RateLimitBackend {
    RateLimitBackend::Memory
}

fn default_rpm() -> u32 {
    60
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_stale_after() -> u64 {
    600
}
