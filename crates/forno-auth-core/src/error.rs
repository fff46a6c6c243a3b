//! Auth errors

use thiserror::Error;

/// Errors of the token protocol
#[derive(Error, Debug)]
pub enum AuthError {
    /// Authorization header missing or not parseable
    #[error("authorization header missing or malformed")]
    MalformedAuthorization,

    /// Unknown username or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Another token mutation for the same user is still in flight
    #[error("another request for this user is in progress")]
    LockBusy,

    /// The user already holds the maximum number of valid refresh tokens
    #[error("refresh token limit reached")]
    RefreshTokenLimitReached,

    /// Presented refresh token is unknown or not valid hex
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Presented refresh token was already rotated. The whole chain has
    /// been revoked in response.
    #[error("refresh token reuse detected")]
    ReuseDetected,

    /// Refresh attempted while the newest access token is still too far
    /// from expiring
    #[error("access token not yet expired")]
    AccessTokenNotExpired,

    /// Presented access token is unknown or expired
    #[error("invalid access token")]
    InvalidAccessToken,

    /// The store queue rejected the mutation
    #[error("store queue is full")]
    QueueFull,

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedAuthorization => 400,
            Self::InvalidCredentials | Self::InvalidRefreshToken | Self::InvalidAccessToken => 401,
            Self::RefreshTokenLimitReached | Self::ReuseDetected => 403,
            Self::AccessTokenNotExpired => 409,
            Self::LockBusy => 429,
            Self::QueueFull | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "credentials_invalid",
            Self::LockBusy => "requesting_too_fast",
            Self::RefreshTokenLimitReached => "reached_refresh_token_limit",
            // Reuse answers with the same code as an unknown token so a
            // thief learns nothing from the response.
            Self::InvalidRefreshToken | Self::ReuseDetected => "invalid_refresh_token",
            Self::AccessTokenNotExpired => "access_token_not_expired",
            Self::InvalidAccessToken => "invalid_access_token",
            Self::MalformedAuthorization
            | Self::QueueFull
            | Self::Database(_)
            | Self::Internal(_) => "error_not_mapped",
        }
    }
}

impl From<forno_db::DbError> for AuthError {
    fn from(err: forno_db::DbError) -> Self {
        tracing::error!("database error: {}", err);
        Self::Database(err.to_string())
    }
}

impl From<forno_db::store::QueueFull> for AuthError {
    fn from(_: forno_db::store::QueueFull) -> Self {
        Self::QueueFull
    }
}
