//! Request handlers.

pub mod auth;
pub mod captcha;
pub mod health;
