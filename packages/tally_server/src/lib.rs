//! Tally server - WebSocket front end for a live voting session
//!
//! Exposes one shared `SessionHub` over HTTP:
//!
//! - `GET /ws/{user_id}`  WebSocket; inbound `ADD_OPTION` / `VOTE` / `REORDER`,
//!   outbound `STATUS_UPDATE`
//! - `GET /api/status`    current session snapshot
//! - `GET /health`        liveness and connection count
//! - `GET /metrics`       transport and broadcast counters

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod ws;

use anyhow::Result;
use axum::{Router, routing::get};
use std::sync::Arc;
use tally_session::SessionHub;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::metrics::ServerMetrics;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SessionHub>,
    pub metrics: Arc<ServerMetrics>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Fresh, empty session for the given config.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            hub: Arc::new(SessionHub::new()),
            metrics: Arc::new(ServerMetrics::new()),
            config: Arc::new(config),
        }
    }
}

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/{user_id}", get(ws::ws_upgrade))
        .route("/api/status", get(handlers::status_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Tally listening on http://{}", addr);
    info!("  GET  /ws/{{user_id}} - Session WebSocket");
    info!("  GET  /api/status    - Current session snapshot");
    info!("  GET  /health        - Health check");
    info!("  GET  /metrics       - Server metrics");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
