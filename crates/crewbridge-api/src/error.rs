// Boundary errors
//
// Anything that escapes a handler (bad request bodies, unknown routes, panics) is
// rendered as a JSON `ErrorResponse` instead of the framework's plain-text default.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crewbridge_core::error::panic_message;
use std::any::Any;
use thiserror::Error;

use crate::common::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be extracted
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    #[error("Not Found")]
    NotFound,

    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        traceback: Option<String>,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected { status, .. } => *status,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let traceback = match &self {
            ApiError::Internal { traceback, .. } => traceback.clone(),
            _ => None,
        };
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            traceback,
        };
        (status, Json(body)).into_response()
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Response for a panic caught by `CatchPanicLayer`
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    tracing::error!(panic = %message, "Unhandled panic in request handler");
    ApiError::Internal {
        traceback: Some(format!("handler panicked: {}", message)),
        message,
    }
    .into_response()
}
