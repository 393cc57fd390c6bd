use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chat::prompts::{RATE_LIMIT_MESSAGE, REMOTE_FAILURE_MESSAGE};
use crate::chat::session::ChatError;
use crate::llm_client::LlmError;
use crate::pdf::PdfError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("Rate limited by the model provider")]
    RateLimited,

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimited => AppError::RateLimited,
            other => AppError::RemoteService(other.to_string()),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage | ChatError::SystemTurnAppend => {
                AppError::Validation(e.to_string())
            }
            ChatError::NothingToRetry => AppError::Conflict(e.to_string()),
            ChatError::Llm(llm) => llm.into(),
        }
    }
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::Unsupported(msg) => AppError::UnsupportedDocument(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::UnsupportedDocument(msg) => {
                tracing::warn!("Rejected upload: {msg}");
                (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "UNSUPPORTED_DOCUMENT",
                    "Please upload a valid, text-based PDF file".to_string(),
                )
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                RATE_LIMIT_MESSAGE.to_string(),
            ),
            AppError::RemoteService(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "REMOTE_SERVICE_ERROR",
                    REMOTE_FAILURE_MESSAGE.to_string(),
                )
            }
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
