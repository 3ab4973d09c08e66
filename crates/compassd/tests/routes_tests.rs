//! HTTP surface tests, driven through the router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use compass_common::{
    Capability, ErrorResponse, HealthResponse, QueryResponse, ToolSettings, ToolsResponse,
};
use compassd::config::{OrchestratorConfig, ServerConfig};
use compassd::orchestrator::Orchestrator;
use compassd::providers::{FakeProvider, ProviderSet};
use compassd::server::{app, AppState};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

struct Harness {
    router: Router,
    search_calls: Arc<Mutex<Vec<compassd::providers::ProviderQuery>>>,
}

fn harness() -> Harness {
    let search = Arc::new(FakeProvider::returning(
        Capability::Search,
        vec![FakeProvider::source(Capability::Search, "Result", 0.7)],
    ));
    let search_calls = search.calls();
    let providers = ProviderSet::new()
        .with(search)
        .with(Arc::new(FakeProvider::empty(Capability::Knowledge)))
        .with(Arc::new(FakeProvider::empty(Capability::Community)))
        .with(Arc::new(FakeProvider::empty(Capability::System)));

    let orchestrator = Orchestrator::new(
        providers,
        OrchestratorConfig::default(),
        ToolSettings::all_enabled(),
    );
    let state = AppState::new(orchestrator, &ServerConfig::default(), Duration::from_secs(2));
    Harness {
        router: app(state),
        search_calls,
    }
}

fn post_query(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// /v1/query
// ============================================================================

#[tokio::test]
async fn test_query_success() {
    let h = harness();
    let response = h
        .router
        .oneshot(post_query(
            r#"{"query": "voice assistant", "vision": "privacy-first Ubuntu"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: QueryResponse = read_json(response).await;
    assert_eq!(body.query, "voice assistant");
    assert_eq!(body.sources.len(), 1);
    assert_eq!(body.sources[0].id, "search-1");
    assert_eq!(body.diagnostics.tool_trace.len(), 4);
    assert!((3..=7).contains(&body.plan.len()));
}

#[tokio::test]
async fn test_blank_query_is_400_and_core_untouched() {
    let h = harness();
    let response = h
        .router
        .oneshot(post_query(r#"{"query": "   "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = read_json(response).await;
    assert!(body.error.contains("query"));
    assert!(h.search_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_query_is_400() {
    let h = harness();
    let response = h.router.oneshot(post_query(r#"{}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let h = harness();
    let response = h.router.oneshot(post_query("{not json")).await.unwrap();
    assert!(response.status().is_client_error());

    let body: ErrorResponse = read_json(response).await;
    assert!(!body.error.is_empty());
    assert!(h.search_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_all_tools_disabled_is_200_with_no_sources() {
    let h = harness();
    let response = h
        .router
        .oneshot(post_query(
            r#"{"query": "x", "enabledTools": {"search": false, "knowledge": false, "community": false, "system": false}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: QueryResponse = read_json(response).await;
    assert!(body.sources.is_empty());
    assert!(!body.summary.is_empty());
    assert!(!body.plan.is_empty());
    assert!(body.diagnostics.tool_trace.is_empty());
    assert!(h.search_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_tool_map_disables_missing_keys() {
    let h = harness();
    let response = h
        .router
        .oneshot(post_query(
            r#"{"query": "x", "enabledTools": {"knowledge": true, "teleport": true}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: QueryResponse = read_json(response).await;
    let traced: Vec<Capability> = body.diagnostics.tool_trace.iter().map(|t| t.tool).collect();
    assert_eq!(traced, vec![Capability::Knowledge]);
    assert!(h.search_calls.lock().unwrap().is_empty());
}

// ============================================================================
// /v1/health and /v1/tools
// ============================================================================

#[tokio::test]
async fn test_health() {
    let response = harness().router.oneshot(get("/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: HealthResponse = read_json(response).await;
    assert_eq!(body.status, "healthy");
    assert_eq!(body.version, compass_common::VERSION);
}

#[tokio::test]
async fn test_tools_listing() {
    let response = harness().router.oneshot(get("/v1/tools")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: ToolsResponse = read_json(response).await;
    assert_eq!(body.tools, Capability::ALL.to_vec());
    assert_eq!(body.configured.len(), 4);
    assert_eq!(body.defaults, ToolSettings::all_enabled());
}
