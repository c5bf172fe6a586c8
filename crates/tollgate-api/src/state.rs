//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tollgate_auth::{
    AccountService, CaptchaService, RateLimiterDispatch, RefreshCoordinator, TokenIssuer,
    TokenSettings, TokenVerifier,
};
use tollgate_cache::CacheManager;
use tollgate_core::config::AppConfig;
use tollgate_core::traits::password::PasswordHasher;
use tollgate_core::traits::user_store::UserStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: CacheManager,
    pub users: Arc<dyn UserStore>,
    pub token_verifier: TokenVerifier,
    pub refresh_coordinator: Arc<RefreshCoordinator>,
    pub account_service: Arc<AccountService>,
    pub captcha_service: Arc<CaptchaService>,
    pub rate_limiter: Arc<RateLimiterDispatch>,
}

impl AppState {
    /// Wire services from configuration and the injected backends.
    pub fn new(
        config: AppConfig,
        cache: CacheManager,
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let op_timeout = config.server.context_timeout();
        let settings = TokenSettings::from_config(&config.auth);
        let issuer = TokenIssuer::from_config(&config.auth);
        let token_verifier = TokenVerifier::from_config(&config.auth);

        let captcha_service = CaptchaService::new(cache.clone(), &config.captcha, op_timeout);

        let refresh_coordinator = RefreshCoordinator::new(
            token_verifier.clone(),
            issuer.clone(),
            settings.clone(),
            Arc::clone(&users),
            op_timeout,
        );

        let account_service = AccountService::new(
            Arc::clone(&users),
            hasher,
            captcha_service.clone(),
            issuer,
            settings,
            config.captcha.required_for_login,
            op_timeout,
        );

        let rate_limiter =
            RateLimiterDispatch::from_config(&config.rate_limit, cache.clone(), op_timeout);

        Self {
            config: Arc::new(config),
            cache,
            users,
            token_verifier,
            refresh_coordinator: Arc::new(refresh_coordinator),
            account_service: Arc::new(account_service),
            captcha_service: Arc::new(captcha_service),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
