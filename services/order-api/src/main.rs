//! Forno Order API
//!
//! Ordering backend service.
//!
//! ## Endpoints
//!
//! - `GET /catalog` - Product catalog
//! - `POST /order` - Hand in a new order
//! - `GET /orders` - List orders (delivery users, access token)
//! - `POST /auth/login` - Issue a refresh/access token pair
//! - `POST /auth/refresh` - Rotate a refresh token
//! - `GET /health`, `GET /ready` - Probes

use std::net::SocketAddr;
use std::sync::Arc;

use forno_auth_core::{AuthService, TokenDigest};
use forno_db::store::{run_store_worker, StoreQueue};
use forno_db::{ensure_schema, Repositories};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use order_api::catalog::Catalog;
use order_api::config::Config;
use order_api::create_router;
use order_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("order_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Forno Order API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Create database pool and bring the schema up
    let pool = forno_db::create_pool(&config.database_url).await?;
    let mut conn = pool.acquire().await?;
    ensure_schema(&mut conn).await?;
    drop(conn);
    tracing::info!("Database pool created");

    // Create repositories and load the catalog snapshot
    let repos = Repositories::new(pool.clone());
    let catalog = Catalog::load(&repos.catalog).await?;
    tracing::info!("Catalog loaded");

    // Start the store worker on its own dedicated connection
    let (queue, queue_rx) = StoreQueue::bounded(config.store_queue_capacity);
    let worker_conn = pool.acquire().await?;
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(run_store_worker(
        worker_conn,
        queue_rx,
        cancel.clone(),
        config.store_refresh_interval,
    ));

    // Create the auth service
    let digest = TokenDigest::new(&config.token_secret)
        .map_err(|err| anyhow::anyhow!("TOKEN_SECRET rejected: {err}"))?;
    let auth = AuthService::new(
        config.auth.clone(),
        digest,
        Arc::new(repos.users.clone()),
        Arc::new(repos.tokens.clone()),
        queue.clone(),
    );

    // Create application state and router
    let state = AppState::new(auth, repos, catalog, queue, pool, config.clone());
    let app = create_router(state);

    // Start the HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the worker drain what is left, then stop it
    cancel.cancel();
    worker.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
