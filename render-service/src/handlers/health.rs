use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint for liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "render-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Ready once an upstream credential is configured.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.image_provider.is_some() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "reason": "GEMINI_API_KEY is not configured"
            })),
        )
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        get_metrics(),
    )
}
