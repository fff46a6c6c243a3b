//! Token protocol handlers (login, refresh)

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use forno_auth_core::TokenGrant;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Free-form description of the logging-in device, stored on the
    /// token chain
    pub device_description: String,
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// POST /auth/login
///
/// Issue a fresh refresh/access token pair against Basic credentials.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenGrant>> {
    let Json(req) = body.map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let grant = state
        .auth
        .login(
            authorization_header(&headers),
            Some(req.device_description),
        )
        .await?;
    Ok(Json(grant))
}

/// POST /auth/refresh
///
/// Rotate a refresh token presented as a Bearer header.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenGrant>> {
    let grant = state.auth.refresh(authorization_header(&headers)).await?;
    Ok(Json(grant))
}
