//! Health Check API Handler
//!
//! Simple health check endpoint for monitoring, including a store ping.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::AppState;
use crate::db;

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match db::ping(&state.pool).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(err) => {
            tracing::error!("Health check store ping failed: {:?}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}
