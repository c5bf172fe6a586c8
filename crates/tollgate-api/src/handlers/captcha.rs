//! Captcha challenge handler.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use tollgate_auth::captcha::ChallengeResponse;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/auth/captcha
///
/// Returns the rendered challenge and sets the session cookie.
pub async fn generate(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<ChallengeResponse>>), ApiError> {
    let issued = state.captcha_service.generate().await?;

    let cookie = Cookie::build((
        state.config.captcha.cookie_name.clone(),
        issued.session_id.to_string(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Json(ApiResponse::ok(issued.response))))
}
