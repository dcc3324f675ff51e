use crate::introspection::json_error;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

pub const OPAQUE_SERVER_DETAILS: &str = "Internal error while analyzing website";

/// Failures surfaced to HTTP callers as `{ "error", "details" }`.
///
/// Provider parse and transport problems are not here: those become degraded
/// results with a 200.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request data: {0}")]
    InvalidRequest(String),
    #[error("request body rejected: {0}")]
    Rejected(#[from] JsonRejection),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(details) => {
                warn!(%details, "rejecting analyze request");
                json_error(StatusCode::BAD_REQUEST, "Invalid request data", &details)
            }
            ApiError::Rejected(rejection) => {
                let status = match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                let details = rejection.body_text();
                warn!(%status, %details, "rejecting analyze request body");
                json_error(status, "Invalid request data", &details)
            }
            ApiError::Internal(e) => {
                error!(error = ?e, "analysis failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error",
                    OPAQUE_SERVER_DETAILS,
                )
            }
        }
    }
}
