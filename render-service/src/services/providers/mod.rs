//! Image provider abstraction.
//!
//! A provider turns a composed prompt into a [`RenderOutcome`]. Transport and
//! HTTP-status failures come back as [`ProviderError`]; anything the upstream
//! answered successfully is classified in the outcome.

pub mod gemini;

use crate::models::RenderResponse;
use async_trait::async_trait;
use serde_json::{json, Value};
use service_core::error::AppError;
use thiserror::Error;

/// Longest diagnostic text echoed back to the caller, in characters.
pub const MAX_DETAIL_CHARS: usize = 2000;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Upstream answered with a non-2xx status.
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Label used for the provider error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            ProviderError::ApiError { body, .. } => AppError::BadGateway {
                message: "Gemini API failed".to_string(),
                details: Some(Value::String(body)),
            },
            ProviderError::NetworkError(msg) => AppError::BadGateway {
                message: "Gemini API request failed".to_string(),
                details: Some(Value::String(msg)),
            },
        }
    }
}

/// What a successful upstream call contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// An inline image part with base64 payload.
    ImageFound { mime_type: String, data: String },
    /// No image, but the model answered with text.
    TextFound { text: String },
    /// Well-formed response with neither image nor text.
    NoContent {
        candidate_count: usize,
        part_keys: Vec<String>,
    },
    /// Body could not be read as a generate-content response.
    Malformed { reason: String, raw: String },
}

impl RenderOutcome {
    /// Label used for the request outcome counter.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderOutcome::ImageFound { .. } => "image",
            RenderOutcome::TextFound { .. } => "text",
            RenderOutcome::NoContent { .. } => "no_content",
            RenderOutcome::Malformed { .. } => "malformed",
        }
    }

    /// Map the outcome onto the response envelope.
    pub fn into_result(self) -> Result<RenderResponse, AppError> {
        match self {
            RenderOutcome::ImageFound { mime_type, data } => {
                Ok(RenderResponse::from_inline_image(&mime_type, &data))
            }
            RenderOutcome::TextFound { text } => Err(AppError::UnusableResponse {
                message: "Gemini returned text instead of an image".to_string(),
                details: Some(Value::String(truncate_for_details(&text))),
            }),
            RenderOutcome::NoContent {
                candidate_count,
                part_keys,
            } => Err(AppError::UnusableResponse {
                message: "No image data returned from Gemini API".to_string(),
                details: Some(json!({
                    "candidateCount": candidate_count,
                    "partKeys": part_keys,
                })),
            }),
            RenderOutcome::Malformed { reason, raw } => Err(AppError::UnusableResponse {
                message: "Unexpected response from Gemini API".to_string(),
                details: Some(json!({
                    "reason": reason,
                    "response": raw,
                })),
            }),
        }
    }
}

/// Cut `text` to [`MAX_DETAIL_CHARS`] characters, marking the cut with `…`.
pub fn truncate_for_details(text: &str) -> String {
    match text.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Trait for image generation providers (e.g., Gemini).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Send `prompt` upstream in a single call and classify the answer.
    async fn generate(&self, prompt: &str) -> Result<RenderOutcome, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn image_outcome_becomes_data_url() {
        let response = RenderOutcome::ImageFound {
            mime_type: "image/png".to_string(),
            data: "QQ==".to_string(),
        }
        .into_result()
        .unwrap();

        assert_eq!(response.image_data_url, "data:image/png;base64,QQ==");
    }

    #[test]
    fn text_outcome_is_a_500_carrying_the_text() {
        let err = RenderOutcome::TextFound {
            text: "Here is a description of a blue fairing".to_string(),
        }
        .into_result()
        .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        match err {
            AppError::UnusableResponse { details, .. } => assert_eq!(
                details,
                Some(json!("Here is a description of a blue fairing"))
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_content_reports_shape() {
        let err = RenderOutcome::NoContent {
            candidate_count: 1,
            part_keys: vec!["thought".to_string()],
        }
        .into_result()
        .unwrap_err();

        match err {
            AppError::UnusableResponse { message, details } => {
                assert_eq!(message, "No image data returned from Gemini API");
                assert_eq!(
                    details,
                    Some(json!({ "candidateCount": 1, "partKeys": ["thought"] }))
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn long_text_is_truncated_on_a_char_boundary() {
        let text = "é".repeat(MAX_DETAIL_CHARS + 10);
        let truncated = truncate_for_details(&text);

        assert_eq!(truncated.chars().count(), MAX_DETAIL_CHARS + 1);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate_for_details("short"), "short");
    }

    #[test]
    fn upstream_status_errors_become_bad_gateway() {
        let err: AppError = ProviderError::ApiError {
            status: 500,
            body: "{\"error\":\"internal\"}".to_string(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        match err {
            AppError::BadGateway { message, details } => {
                assert_eq!(message, "Gemini API failed");
                assert_eq!(details, Some(json!("{\"error\":\"internal\"}")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
