//! Error types for mgnrega-api
//!
//! Three failure classes reach clients:
//! - invalid input (400), user-correctable
//! - upstream unavailable (500), network/timeout/non-success from an
//!   external API
//! - storage (500), record store failure
//!
//! An upstream answer with zero rows is not an error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::UpstreamError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request parameter (400)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External API failed (500)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    /// Record store failure (500)
    #[error("Storage error: {0}")]
    Storage(#[from] mgnrega_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Diagnostic detail: the upstream's raw error body when there is one
    pub fn details(&self) -> Value {
        match self {
            ApiError::UpstreamUnavailable(err) => err.details(),
            other => Value::String(other.to_string()),
        }
    }

    /// Client-facing response with a route-specific message
    ///
    /// Invalid input keeps its own message; server-side failures get the
    /// generic one.
    pub fn respond(self, message: &str) -> ErrorResponse {
        let message = match &self {
            ApiError::InvalidInput(msg) => msg.clone(),
            _ => message.to_string(),
        };
        ErrorResponse {
            status: self.status(),
            code: self.code(),
            message,
            details: None,
            error: self,
        }
    }
}

/// Rendered error: generic message, code and optional upstream detail
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
    error: ApiError,
}

impl ErrorResponse {
    /// Attach the upstream error detail (server-side failures only)
    pub fn with_details(mut self) -> Self {
        if self.status.is_server_error() {
            self.details = Some(self.error.details());
        }
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.error, "{}", self.message);
        }

        let mut body = json!({
            "message": self.message,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (self.status, Json(body)).into_response()
    }
}

/// Result type for API handlers and services
pub type ApiResult<T> = Result<T, ApiError>;
