use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::fetch::FetchError;
use crate::model::ModelError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// 400 covers client-correctable conditions (bad input, bad file, short
/// text, unusable model payload); 500 covers misconfiguration, roster
/// exhaustion, and unexpected failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Download error: {0}")]
    Download(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Every roster entry failed for a model invocation.
    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    /// The model responded but the payload could not be used.
    #[error("Model response error: {0}")]
    ModelResponse(String),

    #[error("Gemini API is not configured. Please set GEMINI_API_KEY in environment variables.")]
    NotConfigured,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Download(msg) => (StatusCode::BAD_REQUEST, "DOWNLOAD_ERROR", msg.clone()),
            AppError::Extraction(msg) => (StatusCode::BAD_REQUEST, "EXTRACTION_ERROR", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ModelResponse(msg) => {
                (StatusCode::BAD_REQUEST, "MODEL_RESPONSE_ERROR", msg.clone())
            }
            AppError::ModelInvocation(msg) => {
                tracing::error!("Model invocation error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "MODEL_ERROR", msg.clone())
            }
            AppError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOT_CONFIGURED",
                self.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Download(e.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        AppError::Extraction(e.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Exhausted { .. } | ModelError::NoModelsAvailable => {
                AppError::ModelInvocation(e.to_string())
            }
            ModelError::Parse(_) | ModelError::MissingField(_) => {
                AppError::ModelResponse(e.to_string())
            }
        }
    }
}
