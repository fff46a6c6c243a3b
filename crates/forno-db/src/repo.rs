//! Repository traits
//!
//! Define async repository interfaces for the read paths of the backend.
//! Writes go through the store queue instead (see [`crate::store`]).

use async_trait::async_trait;

use crate::error::DbResult;
use crate::models::*;

/// Delivery user repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a delivery user by username
    async fn find_by_username(&self, username: &str) -> DbResult<Option<DeliveryUserRow>>;

    /// Create a new delivery user. Provisioning is an out-of-band concern;
    /// this exists for tooling and tests.
    async fn create(&self, user: CreateDeliveryUser) -> DbResult<DeliveryUserRow>;
}

/// Create delivery user input
#[derive(Debug, Clone)]
pub struct CreateDeliveryUser {
    pub username: String,
    pub pw_hash: String,
    pub date_created: i64,
}

/// Token repository trait
///
/// Covers the read side of the token protocol. Token mutations are
/// transactional and executed by the store worker.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Find a refresh token by the hash of its secret
    async fn find_refresh_by_hash(&self, token_hash: &str) -> DbResult<Option<RefreshTokenRow>>;

    /// Re-read a refresh token by id. Used under the per-user lock to get a
    /// fresh view instead of trusting a possibly stale earlier read.
    async fn find_refresh_by_id(&self, refresh_token_id: i64)
        -> DbResult<Option<RefreshTokenRow>>;

    /// Find a refresh token description by id
    async fn find_description(
        &self,
        description_id: i64,
    ) -> DbResult<Option<RefreshTokenDescriptionRow>>;

    /// Count the valid refresh tokens a user currently holds across all of
    /// their description chains
    async fn count_valid_for_user(&self, user_id: i64) -> DbResult<i64>;

    /// All access tokens issued for a refresh token
    async fn access_tokens_for_refresh(
        &self,
        refresh_token_id: i64,
    ) -> DbResult<Vec<AccessTokenRow>>;

    /// Find an access token by the hash of its secret
    async fn find_access_by_hash(&self, token_hash: &str) -> DbResult<Option<AccessTokenRow>>;
}

/// Catalog repository trait
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Load the whole catalog: categories with items, prices and specialities
    async fn load(&self) -> DbResult<Vec<CategoryRecord>>;
}

/// Order repository trait
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// All orders with their items, newest first
    async fn all_orders(&self) -> DbResult<Vec<OrderRecord>>;
}
