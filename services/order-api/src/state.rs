//! Application state

use std::ops::Deref;
use std::sync::Arc;

use forno_auth_core::AuthService;
use forno_db::store::StoreQueue;
use forno_db::{DbPool, Repositories, SqliteTokenRepository, SqliteUserRepository};

use crate::catalog::Catalog;
use crate::config::Config;

/// Type alias for the auth service with concrete repository types
pub type AuthServiceImpl = AuthService<SqliteUserRepository, SqliteTokenRepository>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for the token protocol
    pub auth: Arc<AuthServiceImpl>,
    /// Database repositories (read paths)
    pub repos: Repositories,
    /// Catalog snapshot loaded at startup
    pub catalog: Arc<Catalog>,
    /// Producer handle for the store queue (write path)
    pub queue: StoreQueue,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        auth: AuthServiceImpl,
        repos: Repositories,
        catalog: Catalog,
        queue: StoreQueue,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            repos,
            catalog: Arc::new(catalog),
            queue,
            pool: SharedPool(Arc::new(pool)),
            config: Arc::new(config),
        }
    }
}
