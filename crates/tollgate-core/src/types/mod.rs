//! Shared domain types.

pub mod id;
pub mod response;
pub mod user;

pub use id::{CaptchaSessionId, UserId};
pub use response::ApiErrorResponse;
pub use user::{NewUser, Principal, User};
