//! REST API Routes Module
//!
//! - Ask-a-question (agent pipeline)
//! - Dataset ingest / append / delete-table
//! - Table analysis
//! - Health check endpoints
//! - CORS support for browser-based clients

pub mod analyze;
pub mod ask;
pub mod dataset;
pub mod health;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Uploads can be large; cap request bodies at 50 MB.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the full API router over shared state.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health/ping", get(health::ping))
        .route("/health/live", get(health::liveness))
        .route("/api/ask", post(ask::ask))
        .route("/api/datasets", post(dataset::ingest_dataset))
        .route("/api/datasets/:id/append", post(dataset::append_dataset))
        .route("/api/datasets/:id/tables/:table", delete(dataset::delete_table))
        .route("/api/analyze", post(analyze::analyze))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
