//! Failure envelope shared by the HTTP services.
//!
//! Every error renders as `{"success": false, "error": ..., "details"?: ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    /// The upstream dependency failed or could not be reached.
    #[error("Bad Gateway: {message}")]
    BadGateway {
        message: String,
        details: Option<Value>,
    },

    /// The upstream answered successfully but with nothing usable.
    #[error("Unusable upstream response: {message}")]
    UnusableResponse {
        message: String,
        details: Option<Value>,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Body of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::UnusableResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorResponse {
        let (error, details) = match self {
            AppError::BadRequest(msg) => (msg, None),
            AppError::MethodNotAllowed => ("Method not allowed".to_string(), None),
            // Config messages name the missing setting and are operator-facing.
            AppError::ConfigError(err) => (err.to_string(), None),
            AppError::BadGateway { message, details } => (message, details),
            AppError::UnusableResponse { message, details } => (message, details),
            AppError::InternalError(err) => (
                "Internal server error".to_string(),
                Some(Value::String(err.to_string())),
            ),
        };

        ErrorResponse {
            success: false,
            error,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.into_body())).into_response()
    }
}
