//! API routes for compassd

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use compass_common::{
    Capability, CompassError, ErrorResponse, HealthResponse, QueryRequest, QueryResponse,
    ToolsResponse,
};
use std::sync::Arc;
use tracing::{error, info, warn};

type AppStateArc = Arc<AppState>;
type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Status from the error; body never carries internal detail
fn compass_error(err: &CompassError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, err.public_message())
}

// ============================================================================
// Query Routes
// ============================================================================

pub fn query_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/query", post(answer_query))
}

async fn answer_query(
    State(state): State<AppStateArc>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        warn!("Rejected query body: {}", rejection.body_text());
        api_error(rejection.status(), rejection.body_text())
    })?;

    let validated = req.validate(state.orchestrator.default_tools()).map_err(|e| {
        info!("Rejected query: {}", e);
        compass_error(&e)
    })?;

    // Own task so a panic in the core becomes a 500 instead of a dropped connection
    let orchestrator = Arc::clone(&state.orchestrator);
    let handle = tokio::spawn(async move { orchestrator.answer(validated).await });

    match handle.await {
        Ok(Ok(response)) => Ok(Json(response)),
        Ok(Err(e)) => {
            error!("Orchestration failed: {}", e);
            Err(compass_error(&e))
        }
        Err(join_err) => {
            error!("Orchestration task aborted: {}", join_err);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error"))
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: compass_common::VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Tools Routes
// ============================================================================

pub fn tools_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/tools", get(list_tools))
}

async fn list_tools(State(state): State<AppStateArc>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: Capability::ALL.to_vec(),
        configured: state.orchestrator.configured().to_vec(),
        defaults: state.orchestrator.default_tools(),
    })
}
