//! Application builder: wires router, middleware and state into an Axum app.

use std::any::Any;

use axum::Router;
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use tollgate_core::config::app::ServerConfig;
use tollgate_core::error::AppError;

use crate::error::ApiError;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::TRACE_ID_HEADER;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server = state.config.server.clone();
    with_middleware(build_router(state), &server)
}

/// Outer middleware stack, outermost last: trace id, tracing, CORS, panic recovery.
fn with_middleware(router: Router, server: &ServerConfig) -> Router {
    let trace_header = HeaderName::from_static(TRACE_ID_HEADER);

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(build_cors_layer(&server.cors))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(trace_header.clone()))
        .layer(SetRequestIdLayer::new(trace_header, MakeRequestUuid))
}

/// Converts a handler panic into the standard 500 error body.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    ApiError(AppError::internal(format!("Handler panicked: {detail}"))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    async fn explode() -> &'static str {
        panic!("boom")
    }

    fn panicking_app() -> Router {
        let router = Router::new()
            .route("/explode", get(explode))
            .route("/ok", get(|| async { "fine" }));
        with_middleware(router, &ServerConfig::default())
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let response = panicking_app()
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(TRACE_ID_HEADER));

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("\"INTERNAL\""));
        assert!(body.contains("Internal server error"));
        assert!(!body.contains("boom"));
    }

    #[tokio::test]
    async fn test_server_keeps_serving_after_panic() {
        let app = panicking_app();

        let first = app
            .clone()
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let second = app
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
    }
}
