//! SQLite repository implementations

mod catalog;
mod order;
mod token;
mod user;

pub use catalog::SqliteCatalogRepository;
pub use order::SqliteOrderRepository;
pub use token::SqliteTokenRepository;
pub use user::SqliteUserRepository;

use crate::pool::DbPool;

/// All repositories bundled for application state
#[derive(Clone)]
pub struct Repositories {
    pub users: SqliteUserRepository,
    pub tokens: SqliteTokenRepository,
    pub catalog: SqliteCatalogRepository,
    pub orders: SqliteOrderRepository,
}

impl Repositories {
    /// Create all repositories sharing one pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: SqliteUserRepository::new(pool.clone()),
            tokens: SqliteTokenRepository::new(pool.clone()),
            catalog: SqliteCatalogRepository::new(pool.clone()),
            orders: SqliteOrderRepository::new(pool),
        }
    }
}
