//! API Module
//!
//! HTTP API layer for the validation service.
//! Each submodule handles endpoints for a specific concern.

pub mod download;
pub mod error;
pub mod health;
pub mod job;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::service::job::JobLifecycle;
use crate::worker::dispatcher::Dispatcher;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub lifecycle: JobLifecycle,
    pub dispatcher: Dispatcher,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/jobs", post(job::submit_job).get(job::list_jobs))
        .route("/jobs/{id}", get(job::get_job))
        // Result retrieval
        .route("/downloads/{filename}", get(download::download_result))
        // Oversized uploads are rejected before any processing starts
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
