use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AppState, HealthResponse};
use crate::models::unix_timestamp;

/// Liveness plus store reachability.
///
/// # Endpoint
/// `GET /health`
///
/// Always answers 200. A down store is reported, not treated as a failure,
/// because the cached endpoints keep serving without it.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let redis = state.cache().health().await;

    Json(HealthResponse {
        status: "healthy",
        redis,
        timestamp: unix_timestamp(),
    })
}
