//! Token issuance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::config::AuthConfig;
use tollgate_core::result::AppResult;
use tollgate_core::types::user::Principal;

use super::claims::{AccessClaims, RefreshClaims, expiry};
use super::codec;

/// Secrets and lifetimes used when issuing a pair.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_hours: u32,
    pub refresh_ttl_hours: u32,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_ttl_hours", &self.access_ttl_hours)
            .field("refresh_ttl_hours", &self.refresh_ttl_hours)
            .finish_non_exhaustive()
    }
}

impl TokenSettings {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl_hours: config.access_token_expiry_hours,
            refresh_ttl_hours: config.refresh_token_expiry_hours,
        }
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token, scheme prefix included.
    pub access_token: String,
    /// Long-lived refresh token, scheme prefix included.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Creates signed, scheme-prefixed access and refresh tokens.
///
/// Stateless apart from the prefix; the only side effect is reading the clock.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    prefix: String,
}

impl TokenIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_prefix.clone())
    }

    /// Issue an access token valid for `ttl_hours` from now.
    pub fn issue_access_token(
        &self,
        principal: &Principal,
        secret: &str,
        ttl_hours: u32,
    ) -> AppResult<String> {
        self.issue_access_token_at(principal, secret, ttl_hours, Utc::now())
    }

    pub fn issue_access_token_at(
        &self,
        principal: &Principal,
        secret: &str,
        ttl_hours: u32,
        issued_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = AccessClaims::new(principal, issued_at, ttl_hours)?;
        Ok(self.prefixed(codec::encode(&claims, secret)?))
    }

    /// Issue a refresh token valid for `ttl_hours` from now.
    pub fn issue_refresh_token(
        &self,
        principal: &Principal,
        secret: &str,
        ttl_hours: u32,
    ) -> AppResult<String> {
        self.issue_refresh_token_at(principal, secret, ttl_hours, Utc::now())
    }

    pub fn issue_refresh_token_at(
        &self,
        principal: &Principal,
        secret: &str,
        ttl_hours: u32,
        issued_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = RefreshClaims::new(principal, issued_at, ttl_hours)?;
        Ok(self.prefixed(codec::encode(&claims, secret)?))
    }

    /// Issue both tokens from a single instant. Returns both or an error.
    pub fn issue_pair(&self, principal: &Principal, settings: &TokenSettings) -> AppResult<TokenPair> {
        self.issue_pair_at(principal, settings, Utc::now())
    }

    pub fn issue_pair_at(
        &self,
        principal: &Principal,
        settings: &TokenSettings,
        issued_at: DateTime<Utc>,
    ) -> AppResult<TokenPair> {
        let access_token = self.issue_access_token_at(
            principal,
            &settings.access_secret,
            settings.access_ttl_hours,
            issued_at,
        )?;
        let refresh_token = self.issue_refresh_token_at(
            principal,
            &settings.refresh_secret,
            settings.refresh_ttl_hours,
            issued_at,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: expiry(issued_at, settings.access_ttl_hours)?,
            refresh_expires_at: expiry(issued_at, settings.refresh_ttl_hours)?,
        })
    }

    fn prefixed(&self, token: String) -> String {
        format!("{}{token}", self.prefix)
    }
}
