//! Mapping from engine errors to HTTP responses

use axum::{http::StatusCode, Json};
use roster_core::{ErrorKind, RosterError};
use tracing::error;

use crate::models::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert an engine error into the API error shape.
///
/// Internal failures are logged and replaced by a generic message.
pub fn api_error(err: RosterError) -> ApiError {
    let status = status_for(err.kind());
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Request failed");
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    (
        status,
        Json(ErrorResponse {
            error: message,
            code: Some(err.code().to_string()),
        }),
    )
}

pub fn internal_error(message: impl std::fmt::Display) -> ApiError {
    error!(error = %message, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: Some("INTERNAL_ERROR".to_string()),
        }),
    )
}
