//! Auth service - login, token rotation and access checks
//!
//! All token mutations follow the same shape: parse credentials, take the
//! per-user lock without blocking, decide under the lock, then hand the
//! mutation to the store queue together with the lock guard. The guard is
//! released by the worker after the write ran, so no second mutation for
//! the same user can interleave with a pending one.

use std::sync::Arc;

use chrono::Utc;
use forno_db::store::{
    CreateAccessToken, CreateRefreshToken, NewDescription, StoreOperation, StoreQueue,
};
use forno_db::{AccessTokenRow, TokenRepository, UserRepository};

use crate::{
    config::AuthConfig,
    crypto::TokenDigest,
    headers::{parse_basic_auth, parse_bearer_token},
    locks::UserLocks,
    password::verify_password,
    token::{AccessTokenGrant, RefreshTokenGrant, TokenGrant, TokenSecret},
    AuthError,
};

/// Authentication service
///
/// Owns the token digest key, the per-user lock registry and the producer
/// side of the store queue. Reads go through the repositories; writes are
/// deferred to the store worker.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    config: AuthConfig,
    digest: TokenDigest,
    users: Arc<U>,
    tokens: Arc<T>,
    locks: UserLocks,
    queue: StoreQueue,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    /// Create a new auth service
    pub fn new(
        config: AuthConfig,
        digest: TokenDigest,
        users: Arc<U>,
        tokens: Arc<T>,
        queue: StoreQueue,
    ) -> Self {
        Self {
            config,
            digest,
            users,
            tokens,
            locks: UserLocks::new(),
            queue,
        }
    }

    /// Log a delivery user in with a Basic authorization header.
    ///
    /// On success a fresh refresh/access token pair starts a new description
    /// chain. The pair is returned immediately; persistence is deferred to
    /// the store worker while the user's lock stays held.
    pub async fn login(
        &self,
        authorization: Option<&str>,
        device_description: Option<String>,
    ) -> Result<TokenGrant, AuthError> {
        let credentials =
            parse_basic_auth(authorization).ok_or(AuthError::MalformedAuthorization)?;

        let user = self
            .users
            .find_by_username(&credentials.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&credentials.password, &user.pw_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let guard = self
            .locks
            .try_acquire(user.user_id)
            .ok_or(AuthError::LockBusy)?;

        // Checked under the lock so two parallel logins cannot both pass.
        let valid_count = self.tokens.count_valid_for_user(user.user_id).await?;
        if valid_count + 1 > i64::from(self.config.max_refresh_tokens) {
            tracing::info!(
                user_id = user.user_id,
                valid_count,
                "refresh token limit reached"
            );
            return Err(AuthError::RefreshTokenLimitReached);
        }

        let now = Utc::now().timestamp();
        let refresh_secret = TokenSecret::generate(&self.digest);
        let access_secret = TokenSecret::generate(&self.digest);
        let expiration_time = now + self.config.access_token_valid_time.as_secs() as i64;

        self.queue.submit(StoreOperation::InsertTokens {
            refresh: CreateRefreshToken {
                originated_from: None,
                token_hash: refresh_secret.hash.clone(),
                issuing_time: now,
                description: NewDescription::Create {
                    user_id: user.user_id,
                    device_description,
                },
            },
            access: CreateAccessToken {
                token_hash: access_secret.hash.clone(),
                expiration_time,
            },
            guard: Some(guard),
        })?;

        tracing::info!(user_id = user.user_id, "login issued new token chain");
        Ok(TokenGrant {
            refresh_token: RefreshTokenGrant {
                token: refresh_secret.hex,
            },
            access_token: AccessTokenGrant {
                token: access_secret.hex,
                expiration_time,
            },
        })
    }

    /// Rotate a refresh token presented as a Bearer authorization header.
    ///
    /// Rotation invalidates the presented token and issues a successor pair
    /// on the same description chain. Presenting an already rotated token is
    /// treated as theft: the whole chain is revoked and the request fails.
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<TokenGrant, AuthError> {
        let token_hex =
            parse_bearer_token(authorization).ok_or(AuthError::MalformedAuthorization)?;
        // A token that is not even hex cannot be one we issued.
        let presented = TokenSecret::from_hex(&self.digest, token_hex)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let refresh = self
            .tokens
            .find_refresh_by_hash(&presented.hash)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        let description = self
            .tokens
            .find_description(refresh.description_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let guard = self
            .locks
            .try_acquire(description.user_id)
            .ok_or(AuthError::LockBusy)?;

        // Re-read under the lock; the first read raced other requests.
        let refresh = self
            .tokens
            .find_refresh_by_id(refresh.refresh_token_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !refresh.valid {
            tracing::warn!(
                user_id = description.user_id,
                description_id = refresh.description_id,
                "rotated refresh token presented again, revoking chain"
            );
            self.queue.submit(StoreOperation::RevokeChain {
                description_id: refresh.description_id,
            })?;
            drop(guard);
            return Err(AuthError::ReuseDetected);
        }

        // Refreshing is only allowed close to access token expiry.
        let now = Utc::now().timestamp();
        let newest_expiration = self
            .tokens
            .access_tokens_for_refresh(refresh.refresh_token_id)
            .await?
            .iter()
            .map(|token| token.expiration_time)
            .max();
        if let Some(expiration) = newest_expiration {
            let transition = self.config.access_token_transition_time.as_secs() as i64;
            if expiration - now > transition {
                return Err(AuthError::AccessTokenNotExpired);
            }
        }

        let refresh_secret = TokenSecret::generate(&self.digest);
        let access_secret = TokenSecret::generate(&self.digest);
        let expiration_time = now + self.config.access_token_valid_time.as_secs() as i64;

        self.queue.submit(StoreOperation::RotateTokens {
            invalidate_id: refresh.refresh_token_id,
            refresh: CreateRefreshToken {
                originated_from: Some(refresh.refresh_token_id),
                token_hash: refresh_secret.hash.clone(),
                issuing_time: now,
                description: NewDescription::Existing(refresh.description_id),
            },
            access: CreateAccessToken {
                token_hash: access_secret.hash.clone(),
                expiration_time,
            },
            guard: Some(guard),
        })?;

        tracing::debug!(user_id = description.user_id, "refresh token rotated");
        Ok(TokenGrant {
            refresh_token: RefreshTokenGrant {
                token: refresh_secret.hex,
            },
            access_token: AccessTokenGrant {
                token: access_secret.hex,
                expiration_time,
            },
        })
    }

    /// Validate an access token presented as a Bearer authorization header.
    ///
    /// Succeeds only for a known, unexpired access token. No lock is taken;
    /// access checks are read-only.
    pub async fn check_access(
        &self,
        authorization: Option<&str>,
    ) -> Result<AccessTokenRow, AuthError> {
        let token_hex =
            parse_bearer_token(authorization).ok_or(AuthError::MalformedAuthorization)?;
        let presented = TokenSecret::from_hex(&self.digest, token_hex)
            .map_err(|_| AuthError::InvalidAccessToken)?;

        let access = self
            .tokens
            .find_access_by_hash(&presented.hash)
            .await?
            .ok_or(AuthError::InvalidAccessToken)?;
        if access.expiration_time < Utc::now().timestamp() {
            return Err(AuthError::InvalidAccessToken);
        }
        Ok(access)
    }

    /// The lock registry, exposed for inspection in tests
    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }
}

impl<U: UserRepository, T: TokenRepository> std::fmt::Debug for AuthService<U, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
