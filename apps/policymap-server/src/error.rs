//! Error types for the policymap server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use policy_engine::AssetError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid facts upload: {0}")]
    InvalidFacts(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No mind map loaded in this session")]
    OutlineNotLoaded,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("Session '{}' not found", id),
            ),
            ServerError::InvalidFacts(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_FACTS", msg.clone())
            }
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::OutlineNotLoaded => (
                StatusCode::CONFLICT,
                "OUTLINE_NOT_LOADED",
                "Load the mind map before downloading it".to_string(),
            ),
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    msg.clone(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AssetError> for ServerError {
    fn from(err: AssetError) -> Self {
        ServerError::Internal(err.to_string())
    }
}
