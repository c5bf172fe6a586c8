//! Per-client throttling of the credential endpoints.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use tollgate_auth::RateLimiter;
use tollgate_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::client::client_identity;
use crate::state::AppState;

/// Rejects the request with 429 when the limiter refuses the client.
pub async fn throttle(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity = client_identity(&request, state.config.server.trust_forwarded_for);

    if !state.rate_limiter.admit(&identity).await {
        debug!(%identity, path = %request.uri().path(), "Request throttled");
        return ApiError(AppError::too_many_requests("Too many requests")).into_response();
    }

    next.run(request).await
}
