use axum::Json;
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use log::{ error, warn };
use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

pub const GENERIC_FAILURE: &str = "Failed to process chat request.";

/// Failures of the relay endpoint, rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request payload.")]
    InvalidPayload,
    #[error("Message history is empty.")]
    EmptyHistory,
    #[error("{0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("{0}")]
    Upstream(#[from] LlmError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload | ApiError::EmptyHistory => StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(_) | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut message = self.to_string();
        if message.trim().is_empty() {
            message = GENERIC_FAILURE.to_string();
        }
        if status.is_server_error() {
            error!("Chat route error: {}", message);
        } else {
            warn!("Rejected chat request: {}", message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
