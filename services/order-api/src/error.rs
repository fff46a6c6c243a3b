//! Error types for the Order API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Order is not valid")]
    OrderNotValid,

    #[error("Auth error")]
    Auth(#[from] forno_auth_core::AuthError),

    #[error("Database error")]
    Database(#[from] forno_db::DbError),

    #[error("Store queue is full")]
    QueueFull(#[from] forno_db::store::QueueFull),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::OrderNotValid => StatusCode::BAD_REQUEST,
            Self::Auth(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Database(_) | Self::QueueFull(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "error_not_mapped",
            Self::OrderNotValid => "order_not_valid",
            Self::Auth(err) => err.error_code(),
            Self::Database(_) | Self::QueueFull(_) => "error_not_mapped",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "internal API error");
        } else {
            tracing::info!(error = %self, code, "request rejected");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use forno_auth_core::AuthError;

    #[test]
    fn test_auth_errors_keep_their_codes() {
        let err = ApiError::from(AuthError::LockBusy);
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error_code(), "requesting_too_fast");

        let err = ApiError::from(AuthError::AccessTokenNotExpired);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "access_token_not_expired");
    }

    #[test]
    fn test_order_not_valid() {
        let err = ApiError::OrderNotValid;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "order_not_valid");
    }
}
