//! Error handling utilities for route handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON error body: `{ "success": false, "error": "..." }`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<crate::domain::collection::ValidationError> for ApiError {
    fn from(e: crate::domain::collection::ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

/// Extension trait for logging errors and converting to ApiError
pub trait LogErr<T> {
    /// Log error with context and return 500 carrying the error's own message
    fn log_500(self, context: &str) -> Result<T, ApiError>;

    /// Log error with context and return a custom status and client-facing message
    fn log_status(self, context: &str, status: StatusCode, message: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!(error = %e, "{}", context);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }

    fn log_status(self, context: &str, status: StatusCode, message: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!(error = %e, "{}", context);
            ApiError::new(status, message)
        })
    }
}
