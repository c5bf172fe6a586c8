//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request body.
///
/// The captcha session id normally travels in a cookie; `captcha_session`
/// lets non-browser clients pass it in the body instead.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    pub captcha_answer: Option<String>,
    #[serde(default)]
    pub captcha_session: Option<String>,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}
