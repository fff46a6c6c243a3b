//! Catalog handler

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::state::AppState;

/// GET /catalog
///
/// Serve the catalog snapshot loaded at startup. No auth.
pub async fn get_catalog(State(state): State<AppState>) -> Json<Value> {
    Json(state.catalog.response().clone())
}
