//! Token verification.

use chrono::{DateTime, Utc};

use tollgate_core::config::AuthConfig;
use tollgate_core::result::AppResult;
use tollgate_core::types::id::UserId;

use super::claims::TokenClaims;
use super::codec;

/// Verifies tokens with or without the scheme prefix.
///
/// Failures keep their kind: `Expired`, `InvalidSignature` or `Malformed`.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    prefix: String,
}

impl TokenVerifier {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_prefix.clone())
    }

    /// Verify a token and return its subject.
    pub fn verify<C: TokenClaims>(&self, token: &str, secret: &str) -> AppResult<UserId> {
        self.verify_at::<C>(token, secret, Utc::now())
    }

    pub fn verify_at<C: TokenClaims>(
        &self,
        token: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<UserId> {
        Ok(self.claims_at::<C>(token, secret, now)?.subject())
    }

    /// Verify a token and return its full claims.
    pub fn claims<C: TokenClaims>(&self, token: &str, secret: &str) -> AppResult<C> {
        self.claims_at(token, secret, Utc::now())
    }

    pub fn claims_at<C: TokenClaims>(
        &self,
        token: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<C> {
        codec::decode_at(self.strip_prefix(token), secret, now)
    }

    fn strip_prefix<'a>(&self, token: &'a str) -> &'a str {
        let token = token.trim();
        token
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(token)
            .trim_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::claims::{AccessClaims, RefreshClaims};
    use crate::token::issuer::TokenIssuer;
    use chrono::TimeDelta;
    use tollgate_core::error::ErrorKind;
    use tollgate_core::types::user::Principal;

    const ACCESS: &str = "access-secret";
    const REFRESH: &str = "refresh-secret";

    fn principal() -> Principal {
        Principal {
            id: UserId::new(),
            display_name: "carol".to_string(),
        }
    }

    #[test]
    fn test_verify_before_and_after_ttl() {
        let issuer = TokenIssuer::new("Bearer ");
        let verifier = TokenVerifier::new("Bearer ");
        let p = principal();
        let issued = Utc::now();
        let token = issuer.issue_access_token_at(&p, ACCESS, 2, issued).unwrap();

        let id = verifier
            .verify_at::<AccessClaims>(&token, ACCESS, issued + TimeDelta::minutes(119))
            .unwrap();
        assert_eq!(id, p.id);

        let err = verifier
            .verify_at::<AccessClaims>(&token, ACCESS, issued + TimeDelta::hours(3))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[test]
    fn test_accepts_bare_and_prefixed_forms() {
        let issuer = TokenIssuer::new("Bearer ");
        let verifier = TokenVerifier::new("Bearer ");
        let p = principal();
        let prefixed = issuer.issue_refresh_token(&p, REFRESH, 24).unwrap();
        let bare = prefixed.trim_start_matches("Bearer ").to_string();

        assert_eq!(verifier.verify::<RefreshClaims>(&prefixed, REFRESH).unwrap(), p.id);
        assert_eq!(verifier.verify::<RefreshClaims>(&bare, REFRESH).unwrap(), p.id);
    }

    #[test]
    fn test_access_and_refresh_secrets_are_not_interchangeable() {
        let issuer = TokenIssuer::new("Bearer ");
        let verifier = TokenVerifier::new("Bearer ");
        let token = issuer.issue_access_token(&principal(), ACCESS, 2).unwrap();
        let err = verifier.verify::<AccessClaims>(&token, REFRESH).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSignature);
    }

    #[test]
    fn test_claims_expose_display_name() {
        let issuer = TokenIssuer::new("Bearer ");
        let verifier = TokenVerifier::new("Bearer ");
        let token = issuer.issue_access_token(&principal(), ACCESS, 2).unwrap();
        let claims = verifier.claims::<AccessClaims>(&token, ACCESS).unwrap();
        assert_eq!(claims.name, "carol");
    }
}
