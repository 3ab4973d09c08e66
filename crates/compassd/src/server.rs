//! HTTP server for compassd

use crate::config::ServerConfig;
use crate::orchestrator::Orchestrator;
use crate::routes;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Slack on top of the dispatcher deadline before the HTTP layer gives up
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub start_time: Instant,
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, server: &ServerConfig, deadline: Duration) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
            body_limit_bytes: server.body_limit_bytes,
            request_timeout: deadline + RESPONSE_GRACE,
        }
    }
}

/// Router with all routes and layers; used directly by tests
pub fn app(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;
    let timeout = state.request_timeout;
    let state = Arc::new(state);

    Router::new()
        .merge(routes::query_routes())
        .merge(routes::health_routes())
        .merge(routes::tools_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down gracefully");
    }
}
