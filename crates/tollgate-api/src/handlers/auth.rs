//! Auth handlers: signup, login, refresh, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use tollgate_auth::account::{CaptchaAnswer, LoginInput, SignupInput};
use tollgate_core::error::AppError;

use crate::dto::request::{LoginRequest, RefreshRequest, SignupRequest};
use crate::dto::response::{ApiResponse, AuthResponse, TokenResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let outcome = state
        .account_service
        .signup(SignupInput {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AuthResponse {
            tokens: outcome.tokens.into(),
            user: outcome.user.into(),
        })),
    ))
}

/// POST /api/auth/login
///
/// The captcha cookie is cleared whatever the outcome, because verification
/// consumes the session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), (CookieJar, ApiError)> {
    let cookie_name = state.config.captcha.cookie_name.clone();
    let session_id = req
        .captcha_session
        .or_else(|| jar.get(&cookie_name).map(|c| c.value().to_string()));
    let captcha = req.captcha_answer.map(|answer| CaptchaAnswer {
        session_id: session_id.unwrap_or_default(),
        answer,
    });

    let jar = jar.remove(Cookie::build(cookie_name).path("/"));

    let result = state
        .account_service
        .login(LoginInput {
            email: req.email,
            password: req.password,
            captcha,
        })
        .await;

    match result {
        Ok(outcome) => Ok((
            jar,
            Json(ApiResponse::ok(AuthResponse {
                tokens: outcome.tokens.into(),
                user: outcome.user.into(),
            })),
        )),
        Err(e) => Err((jar, ApiError(e))),
    }
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let pair = state
        .refresh_coordinator
        .refresh(&req.refresh_token)
        .await?;
    Ok(Json(ApiResponse::ok(pair.into())))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = tokio::time::timeout(
        state.config.server.context_timeout(),
        state.users.find_by_id(auth.user_id),
    )
    .await
    .map_err(|_| AppError::unavailable("User store did not respond in time"))??
    .ok_or_else(|| AppError::user_not_found("User not found"))?;

    Ok(Json(ApiResponse::ok(user.into())))
}
