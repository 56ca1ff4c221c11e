//! Fairing render endpoint.
//!
//! Validate method → check credential → parse and validate body → compose
//! prompt → one upstream call → map the outcome onto the envelope.

use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    Json,
};
use service_core::error::AppError;

use crate::{
    models::{RenderRequest, RenderResponse},
    services::{compose_prompt, metrics, RenderOutcome, SYSTEM_PREFIX},
    startup::AppState,
};

/// Render a fairing image from the customization fields in the body.
///
/// Accepts a JSON object, or a JSON string containing one.
pub async fn generate(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<RenderResponse>, AppError> {
    if method != Method::POST {
        metrics::record_render_request("method_not_allowed");
        return Err(AppError::MethodNotAllowed);
    }

    let Some(provider) = state.image_provider.as_ref() else {
        tracing::error!("Render request rejected: GEMINI_API_KEY is not configured");
        metrics::record_render_request("not_configured");
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "GEMINI_API_KEY is not configured"
        )));
    };

    let request = RenderRequest::from_body(&body).map_err(|e| {
        tracing::warn!(error = %e, body_len = body.len(), "Failed to parse render request body");
        metrics::record_render_request("invalid_body");
        e
    })?;

    if let Err(e) = request.validate() {
        metrics::record_render_request("bad_request");
        return Err(e);
    }

    let prompt = compose_prompt(SYSTEM_PREFIX, &request);

    tracing::info!(
        bike_model = request.model.as_deref().unwrap_or("-"),
        has_description = request.prompt.is_some(),
        prompt_len = prompt.len(),
        provider_model = provider.model(),
        "Requesting fairing render"
    );

    let outcome = provider.generate(&prompt).await.map_err(|e| {
        tracing::error!(error = %e, "Image provider call failed");
        metrics::record_provider_error(e.kind());
        metrics::record_render_request(e.kind());
        AppError::from(e)
    })?;

    metrics::record_render_request(outcome.kind());

    match &outcome {
        RenderOutcome::ImageFound { mime_type, data } => {
            tracing::info!(mime_type = %mime_type, data_len = data.len(), "Render succeeded");
        }
        RenderOutcome::TextFound { text } => {
            tracing::warn!(text_len = text.len(), "Gemini returned text instead of an image");
        }
        RenderOutcome::NoContent {
            candidate_count,
            part_keys,
        } => {
            tracing::warn!(
                candidate_count = *candidate_count,
                part_keys = ?part_keys,
                "Gemini response contained no image"
            );
        }
        RenderOutcome::Malformed { reason, .. } => {
            tracing::error!(reason = %reason, "Gemini response could not be parsed");
        }
    }

    outcome.into_result().map(Json)
}
