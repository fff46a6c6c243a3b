//! SQLite token repository implementation

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::{AccessTokenRow, RefreshTokenDescriptionRow, RefreshTokenRow};
use crate::repo::TokenRepository;

/// SQLite token repository
#[derive(Clone)]
pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    /// Create a new token repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn find_refresh_by_hash(&self, token_hash: &str) -> DbResult<Option<RefreshTokenRow>> {
        let token = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT refresh_token_id, originated_from, token_hash, valid,
                   issuing_time, description_id
            FROM refresh_token
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_refresh_by_id(
        &self,
        refresh_token_id: i64,
    ) -> DbResult<Option<RefreshTokenRow>> {
        let token = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT refresh_token_id, originated_from, token_hash, valid,
                   issuing_time, description_id
            FROM refresh_token
            WHERE refresh_token_id = ?
            "#,
        )
        .bind(refresh_token_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_description(
        &self,
        description_id: i64,
    ) -> DbResult<Option<RefreshTokenDescriptionRow>> {
        let description = sqlx::query_as::<_, RefreshTokenDescriptionRow>(
            r#"
            SELECT description_id, user_id, device_description
            FROM refresh_token_description
            WHERE description_id = ?
            "#,
        )
        .bind(description_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(description)
    }

    async fn count_valid_for_user(&self, user_id: i64) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(refresh_token.refresh_token_id)
            FROM refresh_token_description
            JOIN refresh_token
              ON refresh_token.description_id = refresh_token_description.description_id
            WHERE refresh_token_description.user_id = ? AND refresh_token.valid = 1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn access_tokens_for_refresh(
        &self,
        refresh_token_id: i64,
    ) -> DbResult<Vec<AccessTokenRow>> {
        let tokens = sqlx::query_as::<_, AccessTokenRow>(
            r#"
            SELECT access_token_id, refresh_token_id, token_hash, expiration_time
            FROM access_token
            WHERE refresh_token_id = ?
            "#,
        )
        .bind(refresh_token_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    async fn find_access_by_hash(&self, token_hash: &str) -> DbResult<Option<AccessTokenRow>> {
        let token = sqlx::query_as::<_, AccessTokenRow>(
            r#"
            SELECT access_token_id, refresh_token_id, token_hash, expiration_time
            FROM access_token
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}
