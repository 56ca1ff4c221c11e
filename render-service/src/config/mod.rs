use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// Upstream credential. Missing keys fail each render request, not startup.
    pub api_key: Option<Secret<String>>,
    /// Base URL up to and including the API version segment.
    pub base_url: String,
    pub model: String,
    pub response_format: ResponseFormat,
    pub timeout_secs: u64,
}

/// How the `generateContent` call asks for image output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseFormat {
    /// No `generationConfig`; the model decides.
    None,
    /// `generationConfig.responseMimeType = "image/png"`.
    MimeType,
    /// `generationConfig.responseModalities = ["TEXT", "IMAGE"]`.
    Modalities,
}

impl FromStr for ResponseFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ResponseFormat::None),
            "mime-type" | "mime_type" => Ok(ResponseFormat::MimeType),
            "modalities" => Ok(ResponseFormat::Modalities),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_RESPONSE_FORMAT must be one of none, mime-type, modalities (got '{}')",
                other
            ))),
        }
    }
}

impl RenderConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);

        let timeout_secs = get_env("GEMINI_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("GEMINI_TIMEOUT_SECS is invalid: {}", e))
            })?;

        Ok(RenderConfig {
            common,
            gemini: GeminiSettings {
                api_key,
                base_url: get_env("GEMINI_API_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                model: get_env("GEMINI_IMAGE_MODEL", DEFAULT_GEMINI_MODEL),
                response_format: get_env("GEMINI_RESPONSE_FORMAT", "modalities").parse()?,
                timeout_secs,
            },
        })
    }
}

impl GeminiSettings {
    /// Settings pointing at `base_url` with every other knob at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            response_format: ResponseFormat::Modalities,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| default.to_string())
}
