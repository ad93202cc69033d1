//! Common error types for the thumbnail generation service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0} API key not configured")]
    MissingCredential(&'static str),

    #[error("{summary}: {detail}")]
    Upstream { summary: String, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Upstream provider failure with the provider's message attached
    pub fn upstream(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Upstream {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// JSON error envelope returned on every failed request
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<&'static str>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    message: None,
                    required: None,
                },
            ),
            AppError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Missing required fields".to_string(),
                    message: None,
                    required: Some(fields),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: msg,
                    message: None,
                    required: None,
                },
            ),
            AppError::MissingCredential(provider) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: format!("{} API key not configured", provider),
                    message: None,
                    required: None,
                },
            ),
            AppError::Upstream { summary, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: summary,
                    message: Some(detail),
                    required: None,
                },
            ),
            AppError::HttpClient(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "Upstream request failed".to_string(),
                    message: Some(e.to_string()),
                    required: None,
                },
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    message: Some(other.to_string()),
                    required: None,
                },
            ),
        };

        if status.is_server_error() {
            error!(status = %status, error = %body.error, detail = ?body.message, "Request failed");
        } else {
            warn!(status = %status, error = %body.error, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
