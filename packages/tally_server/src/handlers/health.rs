use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;
use crate::metrics;

/// Health check endpoint - returns server status
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics.snapshot(state.hub.stats());

    // Clients disconnecting, cleanly or not, is normal operation. Only a
    // snapshot the hub could not encode means sessions are not being served.
    let status = if snapshot.session.encode_failures == 0 {
        "healthy"
    } else {
        "degraded"
    };

    Json(metrics::HealthStatus {
        status: status.to_string(),
        connections: snapshot.connections.active,
        uptime_secs: snapshot.uptime_secs,
    })
}

/// Metrics endpoint - returns detailed server metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot(state.hub.stats()))
}

/// Current session snapshot, same shape as a broadcast's `data`.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.snapshot().await)
}
