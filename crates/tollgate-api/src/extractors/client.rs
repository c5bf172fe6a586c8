//! Client identity used as the rate-limit key.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// First `X-Forwarded-For` hop when trusted, else the peer address.
///
/// Falls back to `"unknown"` when neither is available (e.g. in tests
/// that do not attach connect info), so such clients share one bucket.
pub fn client_identity(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
