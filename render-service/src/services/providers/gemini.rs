//! Gemini image provider implementation.
//!
//! Calls `models/{model}:generateContent` once per render with the composed
//! prompt as the only content part, then classifies the answer.

use super::{truncate_for_details, ImageProvider, ProviderError, RenderOutcome};
use crate::config::{GeminiSettings, ResponseFormat};
use crate::services::metrics;
use async_trait::async_trait;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// MIME type assumed when an inline part omits one.
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Standard alphabet, padding optional.
const INLINE_DATA_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encoded bytes decoded per step when checking inline data. Multiple of 4.
const BASE64_CHECK_CHUNK: usize = 4096;

/// Gemini image provider.
pub struct GeminiImageProvider {
    api_key: Secret<String>,
    endpoint: String,
    model: String,
    response_format: ResponseFormat,
    client: Client,
}

impl GeminiImageProvider {
    pub fn new(settings: &GeminiSettings) -> Result<Self, ProviderError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured("GEMINI_API_KEY is not configured".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            endpoint: format!(
                "{}/models/{}:generateContent",
                settings.base_url.trim_end_matches('/'),
                settings.model
            ),
            model: settings.model.clone(),
            response_format: settings.response_format,
            client,
        })
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        let generation_config = match self.response_format {
            ResponseFormat::None => None,
            ResponseFormat::MimeType => Some(GenerationConfig {
                response_mime_type: Some(DEFAULT_IMAGE_MIME.to_string()),
                response_modalities: None,
            }),
            ResponseFormat::Modalities => Some(GenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            }),
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiImageProvider {
    async fn generate(&self, prompt: &str) -> Result<RenderOutcome, ProviderError> {
        let request = self.build_request(prompt);

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            response_format = ?self.response_format,
            "Sending request to Gemini API"
        );

        let started = Instant::now();

        // The key travels in the query string, so errors are stripped of their URL.
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        metrics::record_provider_latency(&self.model, started.elapsed().as_secs_f64());

        if !status.is_success() {
            tracing::warn!(
                model = %self.model,
                status = status.as_u16(),
                "Gemini API returned an error status"
            );
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_generate_content(&body))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Classify a `generateContent` response body.
///
/// Candidates and their parts are scanned in order. The first inline image
/// wins; failing that, the first non-empty text part.
pub fn parse_generate_content(body: &str) -> RenderOutcome {
    let malformed = |reason: String| RenderOutcome::Malformed {
        reason,
        raw: truncate_for_details(body),
    };

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return malformed(format!("response is not JSON: {}", e)),
    };

    if !value.is_object() {
        return malformed("response is not a JSON object".to_string());
    }

    let response: GenerateContentResponse = match serde_json::from_value(value.clone()) {
        Ok(response) => response,
        Err(e) => return malformed(format!("unexpected response shape: {}", e)),
    };

    let candidates = response.candidates.unwrap_or_default();
    let parts: Vec<&Part> = candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .filter_map(|content| content.parts.as_ref())
        .flatten()
        .collect();

    let inline_image = parts.iter().copied().find_map(|part| {
        let inline = part.inline_data.as_ref()?;
        let data = inline.data.as_deref().filter(|data| !data.is_empty())?;
        Some((inline, data))
    });

    if let Some((inline, data)) = inline_image {
        if let Err(reason) = check_base64(data) {
            return malformed(format!("inline image data is not valid base64: {}", reason));
        }

        let mime_type = inline
            .mime_type
            .as_deref()
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);

        return RenderOutcome::ImageFound {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        };
    }

    if let Some(text) = parts
        .iter()
        .copied()
        .filter_map(|part| part.text.as_deref())
        .find(|text| !text.is_empty())
    {
        return RenderOutcome::TextFound {
            text: text.to_string(),
        };
    }

    RenderOutcome::NoContent {
        candidate_count: candidates.len(),
        part_keys: part_keys(&value),
    }
}

/// Check that `data` decodes without keeping the decoded bytes around.
///
/// Chunks are quad-aligned, so only the last one may carry a partial quad or
/// padding; `=` anywhere before the trailing run is rejected up front.
fn check_base64(data: &str) -> Result<(), String> {
    let bytes = data.as_bytes();
    let padding = bytes.iter().rev().take_while(|&&b| b == b'=').count();
    if let Some(offset) = bytes[..bytes.len() - padding].iter().position(|&b| b == b'=') {
        return Err(format!("padding before end of data at offset {}", offset));
    }

    let mut scratch = [0u8; BASE64_CHECK_CHUNK / 4 * 3];
    for (index, chunk) in bytes.chunks(BASE64_CHECK_CHUNK).enumerate() {
        INLINE_DATA_ENGINE
            .decode_slice(chunk, &mut scratch)
            .map_err(|e| format!("{} (in bytes starting at {})", e, index * BASE64_CHECK_CHUNK))?;
    }
    Ok(())
}

/// Distinct keys seen on any part, sorted.
fn part_keys(value: &Value) -> Vec<String> {
    let mut keys = BTreeSet::new();

    let candidates = value["candidates"].as_array().into_iter().flatten();
    for candidate in candidates {
        let parts = candidate["content"]["parts"].as_array().into_iter().flatten();
        for part in parts.filter_map(Value::as_object) {
            keys.extend(part.keys().cloned());
        }
    }

    keys.into_iter().collect()
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

// Every field is optional: the upstream shape changes between model versions.

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, alias = "mime_type")]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}
