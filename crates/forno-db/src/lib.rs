//! Forno DB - Database abstractions
//!
//! SQLx-based data layer for the Forno ordering backend: row models,
//! repository traits, SQLite implementations, schema bootstrap and the
//! deferred store queue drained by the background worker.

pub mod error;
pub mod models;
pub mod pool;
pub mod repo;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pool::{create_pool, DbPool};
pub use repo::*;
pub use schema::ensure_schema;
pub use sqlite::{
    Repositories, SqliteCatalogRepository, SqliteOrderRepository, SqliteTokenRepository,
    SqliteUserRepository,
};
pub use store::{
    run_store_worker, CreateAccessToken, CreateOrder, CreateOrderItem, CreateRefreshToken,
    NewDescription, QueueFull, StoreOperation, StoreQueue, UserLockGuard,
};
