//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::types::response::ApiErrorResponse;

/// HTTP-facing wrapper around [`AppError`].
///
/// Handlers return `Result<_, ApiError>` and use `?` on any `AppResult`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Malformed
        | ErrorKind::InvalidSignature
        | ErrorKind::Expired
        | ErrorKind::UserNotFound
        | ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::IncorrectAnswer | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Signing
        | ErrorKind::Cache
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        // Internal details never reach the client.
        let message = if status.is_server_error() && err.kind != ErrorKind::Unavailable {
            tracing::error!(kind = %err.kind, error = %err.message, "Internal server error");
            "Internal server error".to_string()
        } else {
            err.message.clone()
        };

        let body = ApiErrorResponse {
            error: err.kind.to_string(),
            message,
            retryable: err.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_and_invalid_share_status_but_not_code() {
        assert_eq!(status_for(ErrorKind::Expired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::InvalidSignature), StatusCode::UNAUTHORIZED);
        assert_ne!(ErrorKind::Expired.to_string(), ErrorKind::InvalidSignature.to_string());
    }

    #[test]
    fn test_throttle_and_outage_statuses() {
        assert_eq!(status_for(ErrorKind::TooManyRequests), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(ErrorKind::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::IncorrectAnswer), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_message_hidden() {
        let response = ApiError(AppError::internal("db password is hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
    }
}
