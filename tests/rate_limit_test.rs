//! Integration tests for auth-route throttling.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tollgate_core::config::RateLimitBackend;
use tower::ServiceExt;

async fn captcha_from(app: &helpers::TestApp, forwarded_for: &str) -> StatusCode {
    let req = Request::builder()
        .method("GET")
        .uri("/api/auth/captcha")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn test_memory_backend_rejects_after_limit() {
    let app = helpers::TestApp::with_config(|config| {
        config.rate_limit.requests_per_minute = 3;
    })
    .await;

    for _ in 0..3 {
        let response = app.request("GET", "/api/auth/captcha", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let response = app.request("GET", "/api/auth/captcha", None, None).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["error"], "TOO_MANY_REQUESTS");
}

#[tokio::test]
async fn test_shared_backend_rejects_after_limit() {
    let app = helpers::TestApp::with_config(|config| {
        config.rate_limit.backend = RateLimitBackend::Shared;
        config.rate_limit.requests_per_minute = 2;
    })
    .await;

    assert_eq!(
        app.request("GET", "/api/auth/captcha", None, None).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.request("GET", "/api/auth/captcha", None, None).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.request("GET", "/api/auth/captcha", None, None).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_health_is_not_throttled() {
    let app = helpers::TestApp::with_config(|config| {
        config.rate_limit.requests_per_minute = 1;
    })
    .await;

    for _ in 0..5 {
        let response = app.request("GET", "/api/health", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_trusted_forwarded_for_separates_clients() {
    let app = helpers::TestApp::with_config(|config| {
        config.rate_limit.requests_per_minute = 1;
        config.server.trust_forwarded_for = true;
    })
    .await;

    assert_eq!(captcha_from(&app, "203.0.113.7").await, StatusCode::OK);
    assert_eq!(
        captcha_from(&app, "203.0.113.7").await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        captcha_from(&app, "198.51.100.2, 10.0.0.1").await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_untrusted_forwarded_for_is_ignored() {
    let app = helpers::TestApp::with_config(|config| {
        config.rate_limit.requests_per_minute = 1;
    })
    .await;

    assert_eq!(captcha_from(&app, "203.0.113.7").await, StatusCode::OK);
    assert_eq!(
        captcha_from(&app, "198.51.100.2").await,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let app = helpers::TestApp::with_config(|config| {
        config.rate_limit.enabled = false;
        config.rate_limit.requests_per_minute = 1;
    })
    .await;

    for _ in 0..4 {
        let response = app.request("GET", "/api/auth/captcha", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }
}
