//! Server-side state of a pending challenge.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;

/// How long a challenge may be answered.
pub const CAPTCHA_TTL: Duration = Duration::from_secs(300);

/// Question and expected answer of a pending challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaSession {
    pub question: String,
    pub answer: i64,
    pub created_at: DateTime<Utc>,
}

impl CaptchaSession {
    /// Check `submitted` against the stored answer as of `now`.
    ///
    /// Surrounding whitespace and leading zeros are ignored.
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> AppResult<()> {
        let ttl = TimeDelta::from_std(CAPTCHA_TTL).unwrap_or(TimeDelta::MAX);
        if now - self.created_at > ttl {
            return Err(AppError::expired("Captcha has expired"));
        }

        match submitted.trim().parse::<i64>() {
            Ok(value) if value == self.answer => Ok(()),
            _ => Err(AppError::incorrect_answer("Incorrect captcha answer")),
        }
    }
}
