//! HTTP error type for goldrec-qe

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::services::EngineError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Operation not applicable in the current state (422)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Reviewer entry already decided (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// goldrec-common error
    #[error("Common error: {0}")]
    Common(#[from] goldrec_common::Error),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(id) => ApiError::NotFound(format!("recipe {}", id)),
            EngineError::InvalidInput(msg) => ApiError::BadRequest(msg),
            EngineError::InvalidState(msg) => ApiError::InvalidState(msg),
            conflict @ EngineError::Conflict { .. } => ApiError::Conflict(conflict.to_string()),
            EngineError::Storage(err) => ApiError::Common(err),
        }
    }
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::InvalidState(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_STATE"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }

    /// `{"code", "message"}` body shared by error responses and bulk reports
    pub fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::InvalidState(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Common(err) => err.to_string(),
        };
        ErrorBody {
            code: code.to_string(),
            message,
        }
    }
}

/// Error payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Common(ref err) = self {
            tracing::error!(error = %err, "Storage failure");
        }
        let (status, _) = self.status_and_code();
        let body = Json(json!({ "error": self.body() }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
