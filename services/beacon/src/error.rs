//! Error types for the beacon gateway

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Message shown for transport failures that reach the browser
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// Errors that can occur in the beacon gateway
#[derive(Debug, thiserror::Error)]
pub enum BeaconError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid credentials or OTP, carrying the backend's message
    #[error("{0}")]
    Authentication(String),

    /// Rejected before any network call
    #[error("{0}")]
    Validation(String),

    #[error("Backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Not signed in")]
    Unauthorized,
}

impl BeaconError {
    /// Status code and user-facing message for this error
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            BeaconError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            BeaconError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            BeaconError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BeaconError::Backend { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                message.clone(),
            ),
            BeaconError::Http(_) => (
                StatusCode::BAD_GATEWAY,
                GENERIC_FAILURE_MESSAGE.to_string(),
            ),
            BeaconError::Config(_) | BeaconError::Io(_) | BeaconError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_FAILURE_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for BeaconError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        (status, axum::Json(serde_json::json!({ "message": message }))).into_response()
    }
}

/// Result type alias for beacon operations
pub type Result<T> = std::result::Result<T, BeaconError>;
