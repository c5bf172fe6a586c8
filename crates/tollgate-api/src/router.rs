//! Route definitions for the Tollgate HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes and per-route middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes(&state))
        .route("/auth/me", get(handlers::auth::me))
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Credential endpoints, throttled per client identity when enabled.
fn auth_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/captcha", get(handlers::captcha::generate));

    if state.config.rate_limit.enabled {
        routes.route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::throttle,
        ))
    } else {
        routes
    }
}
