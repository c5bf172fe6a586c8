//! HS256 signing and verification of claims payloads.
//!
//! Only HS256 is ever issued or accepted. Expiry is checked here rather
//! than by `jsonwebtoken` so that verification runs against an explicit
//! instant with zero leeway.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;

use super::claims::TokenClaims;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Sign `claims` with `secret`.
///
/// # Panics
///
/// Panics if `secret` is empty.
pub fn encode<C: TokenClaims>(claims: &C, secret: &str) -> AppResult<String> {
    assert!(!secret.is_empty(), "token secret must not be empty");

    jsonwebtoken::encode(
        &Header::new(ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::with_source(ErrorKind::Signing, "Failed to sign token", e))
}

/// Verify and decode a token at the current time.
pub fn decode<C: TokenClaims>(token: &str, secret: &str) -> AppResult<C> {
    decode_at(token, secret, Utc::now())
}

/// Verify and decode a token as of `now`.
///
/// # Panics
///
/// Panics if `secret` is empty.
pub fn decode_at<C: TokenClaims>(token: &str, secret: &str, now: DateTime<Utc>) -> AppResult<C> {
    assert!(!secret.is_empty(), "token secret must not be empty");

    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = jsonwebtoken::decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(map_decode_error)?
    .claims;

    if claims.token_type() != C::TOKEN_TYPE {
        return Err(AppError::malformed(format!(
            "Expected a {:?} token",
            C::TOKEN_TYPE
        )));
    }

    if claims.expires_at() <= now.timestamp() {
        return Err(AppError::expired("Token is expired"));
    }

    Ok(claims)
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
            AppError::with_source(ErrorKind::InvalidSignature, "Invalid token signature", e)
        }
        _ => AppError::with_source(ErrorKind::Malformed, "Malformed token", e),
    }
}
