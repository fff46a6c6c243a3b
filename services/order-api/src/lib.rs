//! Forno Order API
//!
//! HTTP service of the ordering backend: serves the product catalog,
//! accepts orders and runs the token issuance/rotation endpoints for
//! delivery users. Handlers never write to the database directly; all
//! mutations go through the store queue drained by a background worker.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/catalog", get(handlers::get_catalog))
        .route("/order", post(handlers::make_order))
        .route("/orders", get(handlers::list_orders))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
