//! `AuthUser` extractor: pulls the access token from the Authorization header and verifies it.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use tollgate_auth::token::AccessClaims;
use tollgate_core::error::AppError;
use tollgate_core::types::id::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, as asserted by a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub name: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::malformed("Missing Authorization header"))?;

        let claims = state
            .token_verifier
            .claims::<AccessClaims>(header, &state.config.auth.access_token_secret)?;

        Ok(Self {
            user_id: claims.sub,
            name: claims.name,
        })
    }
}
