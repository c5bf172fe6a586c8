//! Arithmetic captcha gating login.
//!
//! A challenge is a small arithmetic problem rendered to a noisy PNG. The
//! answer stays server-side in the cache under an opaque session id and is
//! consumed by the first verification attempt.

pub mod problem;
pub mod render;
pub mod service;
pub mod session;

pub use problem::{MathProblem, Operation};
pub use service::{CaptchaService, ChallengeResponse, IssuedChallenge};
pub use session::{CAPTCHA_TTL, CaptchaSession};
