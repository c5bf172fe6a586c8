//! # tollgate-auth
//!
//! The authentication-token lifecycle and request throttling for Tollgate.
//!
//! ## Modules
//!
//! - `token`: HS256 access/refresh token encoding, issuance and verification
//! - `refresh`: rotation of a refresh token into a new token pair
//! - `rate_limit`: in-process token bucket and shared fixed-window limiters
//! - `captcha`: math challenge generation, rendering and one-shot verification
//! - `password`: Argon2id password hashing
//! - `store`: in-memory user store
//! - `account`: signup and login flows

pub mod account;
pub mod captcha;
pub mod password;
pub mod rate_limit;
pub mod refresh;
pub mod store;
pub mod token;

pub use account::AccountService;
pub use captcha::CaptchaService;
pub use password::Argon2PasswordHasher;
pub use rate_limit::{MemoryRateLimiter, RateLimiter, RateLimiterDispatch, SharedRateLimiter};
pub use refresh::RefreshCoordinator;
pub use store::MemoryUserStore;
pub use token::{TokenIssuer, TokenPair, TokenSettings, TokenVerifier};
