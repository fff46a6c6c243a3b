//! SQLite delivery user repository implementation

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::DeliveryUserRow;
use crate::repo::{CreateDeliveryUser, UserRepository};

/// SQLite delivery user repository
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_username(&self, username: &str) -> DbResult<Option<DeliveryUserRow>> {
        let user = sqlx::query_as::<_, DeliveryUserRow>(
            r#"
            SELECT user_id, username, pw_hash, date_created
            FROM delivery_user
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateDeliveryUser) -> DbResult<DeliveryUserRow> {
        let row = sqlx::query_as::<_, DeliveryUserRow>(
            r#"
            INSERT INTO delivery_user (username, pw_hash, date_created)
            VALUES (?, ?, ?)
            RETURNING user_id, username, pw_hash, date_created
            "#,
        )
        .bind(&user.username)
        .bind(&user.pw_hash)
        .bind(user.date_created)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
