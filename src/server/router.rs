//! Route tables for the product grid and health checks

use crate::products::handlers::{AppState, create, destroy, names, read, update};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

/// Build the product routes
///
/// - POST /products/create  - insert a batch, returns records with ids
/// - POST /products/read    - page, sort and filter, returns `{data, total}`
/// - POST /products/update  - replace a batch by id
/// - POST /products/destroy - delete a batch by id
/// - GET  /products/names   - every product name, for auto-complete
pub fn build_product_routes(state: AppState) -> Router {
    Router::new()
        .route("/products/create", post(create))
        .route("/products/read", post(read))
        .route("/products/update", post(update))
        .route("/products/destroy", post(destroy))
        .route("/products/names", get(names))
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME")
    }))
}
