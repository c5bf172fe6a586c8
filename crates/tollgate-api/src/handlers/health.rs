//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use tollgate_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
///
/// The cache check is bounded by the server's context timeout; a backend
/// that does not answer in time is reported as `unreachable`.
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let timeout = state.config.server.context_timeout();
    let cache = match tokio::time::timeout(timeout, state.cache.health_check()).await {
        Ok(Ok(true)) => "connected",
        Ok(Ok(false)) => "degraded",
        Ok(Err(e)) => {
            warn!(error = %e, "Cache health check failed");
            "unreachable"
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "Cache health check timed out");
            "unreachable"
        }
    };

    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: cache.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tollgate_auth::{Argon2PasswordHasher, MemoryUserStore};
    use tollgate_cache::CacheManager;
    use tollgate_core::config::AppConfig;
    use tollgate_core::result::AppResult;

    use super::*;

    /// Backend whose calls never complete.
    #[derive(Debug)]
    struct StalledCache;

    #[async_trait]
    impl CacheProvider for StalledCache {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            std::future::pending().await
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            std::future::pending().await
        }

        async fn take(&self, _key: &str) -> AppResult<Option<String>> {
            std::future::pending().await
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            std::future::pending().await
        }

        async fn incr_capped(&self, _key: &str, _cap: u64, _window: Duration) -> AppResult<u64> {
            std::future::pending().await
        }

        async fn health_check(&self) -> AppResult<bool> {
            std::future::pending().await
        }
    }

    fn state_with(cache: CacheManager) -> AppState {
        let mut config = AppConfig::default();
        config.auth.access_token_secret = "health-access-secret".to_string();
        config.auth.refresh_token_secret = "health-refresh-secret".to_string();
        config.server.context_timeout_ms = 250;
        AppState::new(
            config,
            cache,
            Arc::new(MemoryUserStore::new()),
            Arc::new(Argon2PasswordHasher::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_cache_reports_unreachable() {
        let state = state_with(CacheManager::from_provider(Arc::new(StalledCache)));

        let started = tokio::time::Instant::now();
        let Json(body) = health(State(state)).await;

        assert_eq!(body.data.status, "ok");
        assert_eq!(body.data.cache, "unreachable");
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
