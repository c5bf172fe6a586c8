//! Unified application error types for Tollgate.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] is what the HTTP
//! boundary uses to choose a status code, so token failures keep distinct
//! kinds (an expired token and a forged token need different remediation).

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A token is structurally invalid (bad encoding, missing claims, wrong type).
    Malformed,
    /// A token signature did not verify, or it was signed with a foreign algorithm.
    InvalidSignature,
    /// A token or captcha session is past its validity window.
    Expired,
    /// The subject of a token no longer exists in the user store.
    UserNotFound,
    /// A captcha answer did not match.
    IncorrectAnswer,
    /// The caller exceeded its request allowance.
    TooManyRequests,
    /// A downstream store or cache timed out or is unreachable. Retryable.
    Unavailable,
    /// Credentials were rejected.
    Authentication,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry).
    Conflict,
    /// Token signing failed.
    Signing,
    /// A cache backend error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "MALFORMED"),
            Self::InvalidSignature => write!(f, "INVALID_SIGNATURE"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::UserNotFound => write!(f, "USER_NOT_FOUND"),
            Self::IncorrectAnswer => write!(f, "INCORRECT_ANSWER"),
            Self::TooManyRequests => write!(f, "TOO_MANY_REQUESTS"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Signing => write!(f, "SIGNING"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Tollgate.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a malformed-token error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    /// Create an invalid-signature error.
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSignature, message)
    }

    /// Create an expiry error (token or captcha).
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create a user-not-found error.
    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserNotFound, message)
    }

    /// Create an incorrect-answer error.
    pub fn incorrect_answer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IncorrectAnswer, message)
    }

    /// Create a rate-limit error.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, message)
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error means the presented token must not be trusted.
    ///
    /// Covers expired, forged and malformed tokens. Callers that need to tell
    /// the user *why* should still match on [`ErrorKind`].
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Malformed | ErrorKind::InvalidSignature | ErrorKind::Expired
        )
    }

    /// Whether the operation may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Unavailable | ErrorKind::Cache)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
