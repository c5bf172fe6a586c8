//! JWT claims payloads for access and refresh tokens.

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::types::id::UserId;
use tollgate_core::types::user::Principal;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token for API requests.
    Access,
    /// Long-lived refresh token for obtaining a new pair.
    Refresh,
}

/// Behaviour shared by every claims payload the codec handles.
pub trait TokenClaims: Serialize + DeserializeOwned {
    /// The only token type this payload may be decoded as.
    const TOKEN_TYPE: TokenType;

    /// Subject (user id).
    fn subject(&self) -> UserId;

    /// Expiration as seconds since the epoch.
    fn expires_at(&self) -> i64;

    /// Token type carried in the payload.
    fn token_type(&self) -> TokenType;
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user ID.
    pub sub: UserId,
    /// Display name at the time of issuance.
    pub name: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
}

impl AccessClaims {
    /// Fails with `Signing` if the expiry is out of the representable range.
    pub fn new(principal: &Principal, issued_at: DateTime<Utc>, ttl_hours: u32) -> AppResult<Self> {
        Ok(Self {
            sub: principal.id,
            name: principal.display_name.clone(),
            iat: issued_at.timestamp(),
            exp: expiry(issued_at, ttl_hours)?.timestamp(),
            token_type: TokenType::Access,
        })
    }
}

impl TokenClaims for AccessClaims {
    const TOKEN_TYPE: TokenType = TokenType::Access;

    fn subject(&self) -> UserId {
        self.sub
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }

    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

/// Claims embedded in every refresh token. Carries no display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
}

impl RefreshClaims {
    pub fn new(principal: &Principal, issued_at: DateTime<Utc>, ttl_hours: u32) -> AppResult<Self> {
        Ok(Self {
            sub: principal.id,
            iat: issued_at.timestamp(),
            exp: expiry(issued_at, ttl_hours)?.timestamp(),
            token_type: TokenType::Refresh,
        })
    }
}

impl TokenClaims for RefreshClaims {
    const TOKEN_TYPE: TokenType = TokenType::Refresh;

    fn subject(&self) -> UserId {
        self.sub
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }

    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

/// `issued_at + ttl_hours`, or a `Signing` error when that overflows.
pub(crate) fn expiry(issued_at: DateTime<Utc>, ttl_hours: u32) -> AppResult<DateTime<Utc>> {
    TimeDelta::try_hours(i64::from(ttl_hours))
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::new(
                ErrorKind::Signing,
                format!("Token lifetime of {ttl_hours} hours is out of range"),
            )
        })
}
