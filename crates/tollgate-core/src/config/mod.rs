//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section has defaults so a partial file is enough.

pub mod app;
pub mod auth;
pub mod cache;
pub mod captcha;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::cache::CacheConfig;
pub use self::captcha::CaptchaConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::{RateLimitBackend, RateLimitConfig};

use crate::error::AppError;

/// Longest token lifetime accepted from configuration (ten years).
pub const MAX_TOKEN_EXPIRY_HOURS: u32 = 24 * 365 * 10;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration files
/// (default.toml + environment overlay + `TOLLGATE__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token secrets, lifetimes and scheme.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Request throttling settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Login captcha settings.
    #[serde(default)]
    pub captcha: CaptchaConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` and environment
    /// variables prefixed with `TOLLGATE__` (e.g. `TOLLGATE__AUTH__ACCESS_TOKEN_SECRET`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TOLLGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects configurations the token and throttling code cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.access_token_secret.is_empty() || self.auth.refresh_token_secret.is_empty() {
            return Err(AppError::configuration("Token secrets must not be empty"));
        }
        if self.auth.access_token_expiry_hours == 0 || self.auth.refresh_token_expiry_hours == 0 {
            return Err(AppError::configuration("Token expiry hours must be positive"));
        }
        if self.auth.access_token_expiry_hours > MAX_TOKEN_EXPIRY_HOURS
            || self.auth.refresh_token_expiry_hours > MAX_TOKEN_EXPIRY_HOURS
        {
            return Err(AppError::configuration(format!(
                "Token expiry hours must not exceed {MAX_TOKEN_EXPIRY_HOURS}"
            )));
        }
        if self.auth.refresh_token_expiry_hours < self.auth.access_token_expiry_hours {
            tracing::warn!(
                access_hours = self.auth.access_token_expiry_hours,
                refresh_hours = self.auth.refresh_token_expiry_hours,
                "Refresh tokens expire before access tokens"
            );
        }
        if self.rate_limit.requests_per_minute == 0 {
            return Err(AppError::configuration(
                "rate_limit.requests_per_minute must be positive",
            ));
        }
        if self.cache.redis.connect_timeout_ms == 0 || self.cache.redis.command_timeout_ms == 0 {
            return Err(AppError::configuration("Redis timeouts must be positive"));
        }
        Ok(())
    }
}
