//! Signup and login.

pub mod service;

pub use service::{AccountService, AuthOutcome, CaptchaAnswer, LoginInput, SignupInput};
