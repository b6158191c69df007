//! HTTP error handling and response conversion.
//!
//! Handlers return [`AppError`], which maps to a status code and a JSON body of
//! the form `{ "error": "..." }`. The full error is logged, only a user-safe
//! message is returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors returned from handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request validation failed (400).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get a user-safe error message (without implementation details).
    fn user_message(&self) -> String {
        match self {
            Self::NotFound(msg) => format!("{} not found", msg),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        tracing::debug!("error={}", self);

        (status, Json(json!({ "error": message }))).into_response()
    }
}
