//! Cache key builders for all Tollgate cache entries.
//!
//! The Redis provider adds its configured namespace on top of these.

use tollgate_core::types::id::CaptchaSessionId;

/// Fixed-window request counter of one client identity.
pub fn rate_limit(identity: &str) -> String {
    format!("rate_limit:{identity}")
}

/// Pending captcha challenge.
pub fn captcha_session(session_id: CaptchaSessionId) -> String {
    format!("captcha:{session_id}")
}
