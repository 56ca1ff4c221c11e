//! Integration tests for the health, readiness and metrics endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{call, router_for, TEST_API_KEY};
use wiremock::MockServer;

#[tokio::test]
async fn health_check_returns_ok() {
    let server = MockServer::start().await;
    let response = call(router_for(&server, None), Method::GET, "/health", "").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "render-service");
    assert!(response.request_id.is_some());
}

#[tokio::test]
async fn readiness_requires_an_api_key() {
    let server = MockServer::start().await;

    let without_key = call(router_for(&server, None), Method::GET, "/ready", "").await;
    assert_eq!(without_key.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(without_key.json()["status"], "not_ready");

    let with_key = call(router_for(&server, Some(TEST_API_KEY)), Method::GET, "/ready", "").await;
    assert_eq!(with_key.status, StatusCode::OK);
    assert_eq!(with_key.json()["status"], "ready");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    render_service::services::metrics::init_metrics().unwrap();
    render_service::services::metrics::record_render_request("image");

    let server = MockServer::start().await;
    let response = call(router_for(&server, None), Method::GET, "/metrics", "").await;

    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.bytes.to_vec()).unwrap();
    assert!(text.contains("render_requests_total"));
}
