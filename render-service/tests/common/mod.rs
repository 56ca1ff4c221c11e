//! Shared helpers for render-service integration tests.
//!
//! Each test drives the router in-process with `tower::ServiceExt::oneshot`
//! and points the Gemini provider at a wiremock server.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Method, Request, StatusCode},
    Router,
};
use render_service::{
    build_router,
    config::{GeminiSettings, RenderConfig},
    AppState,
};
use secrecy::Secret;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-api-key";
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

pub fn test_config(base_url: &str, api_key: Option<&str>) -> RenderConfig {
    RenderConfig {
        common: service_core::config::Config::default(),
        gemini: GeminiSettings {
            api_key: api_key.map(|key| Secret::new(key.to_string())),
            timeout_secs: 5,
            ..GeminiSettings::with_base_url(base_url)
        },
    }
}

pub fn router_with_base_url(base_url: &str, api_key: Option<&str>) -> Router {
    let state = AppState::from_config(test_config(base_url, api_key)).expect("Failed to build state");
    build_router(state)
}

pub fn router_for(server: &MockServer, api_key: Option<&str>) -> Router {
    router_with_base_url(&format!("{}/v1beta", server.uri()), api_key)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub bytes: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).expect("Response body is not JSON")
    }
}

pub async fn call(router: Router, method: Method, uri: &str, body: impl Into<Body>) -> TestResponse {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        request_id,
        bytes,
    }
}

pub async fn post_render(router: Router, body: Value) -> TestResponse {
    call(router, Method::POST, "/api/generate", body.to_string()).await
}

pub fn image_response(mime_type: &str, data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "inlineData": { "mimeType": mime_type, "data": data } }]
            },
            "finishReason": "STOP"
        }]
    })
}

pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Prompt text of every request the fake upstream received.
pub async fn received_prompts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}
