//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use tollgate_api::{AppState, build_app};
use tollgate_auth::captcha::CaptchaSession;
use tollgate_auth::{Argon2PasswordHasher, MemoryUserStore};
use tollgate_cache::{CacheManager, keys};
use tollgate_core::config::AppConfig;
use tollgate_core::traits::cache::CacheProvider;
use tollgate_core::types::id::CaptchaSessionId;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching into the cache
    pub state: AppState,
    /// The concrete user store behind `state.users`
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    /// App with the captcha gate off and throttling effectively unlimited.
    pub async fn new() -> Self {
        Self::with_config(|config| {
            config.captcha.required_for_login = false;
            config.rate_limit.requests_per_minute = 10_000;
        })
        .await
    }

    /// App built from the defaults after `customize` has run.
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.auth.access_token_secret = "integration-access-secret".to_string();
        config.auth.refresh_token_secret = "integration-refresh-secret".to_string();
        config.logging.format = "pretty".to_string();
        customize(&mut config);
        config.validate().expect("Invalid test config");

        let cache = CacheManager::new(&config.cache)
            .await
            .expect("Failed to init cache");

        let users = Arc::new(MemoryUserStore::new());
        let state = AppState::new(
            config,
            cache,
            users.clone(),
            Arc::new(Argon2PasswordHasher::new()),
        );

        Self {
            router: build_app(state.clone()),
            state,
            users,
        }
    }

    /// Sign up a user and return the response body's `data`.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/api/auth/signup",
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }

    /// Fetch a challenge; returns the session cookie value and the stored answer.
    pub async fn captcha(&self) -> (String, i64) {
        let response = self.request("GET", "/api/auth/captcha", None, None).await;
        assert_eq!(response.status, StatusCode::OK);

        let session_id = response
            .cookie(&self.state.config.captcha.cookie_name)
            .expect("Captcha cookie not set");
        let id: CaptchaSessionId = session_id.parse().expect("Cookie is not a session id");
        let session: CaptchaSession = self
            .state
            .cache
            .get_json(&keys::captcha_session(id))
            .await
            .expect("Cache read failed")
            .expect("Captcha session not stored");

        (session_id, session.answer)
    }

    /// Send a request with an optional JSON body and Authorization header.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, token);
        }

        self.send(req, body).await
    }

    /// Send a request carrying a `Cookie` header.
    pub async fn request_with_cookie(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: &str,
    ) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie);

        self.send(req, body).await
    }

    /// Send a bodyless request carrying one extra header.
    pub async fn request_with_header(
        &self,
        method: &str,
        path: &str,
        name: &str,
        value: &str,
    ) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(name, value);

        self.send(req, None).await
    }

    async fn send(&self, req: axum::http::request::Builder, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// Value of the `Set-Cookie` entry named `name`, if any.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| k.trim() == name)
            .map(|(_, v)| v.trim().to_string())
    }
}
