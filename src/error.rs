use crate::services::record_sink::RecordSinkError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    MalformedInput(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Submission rejected")]
    SpamRejected,
    #[error("Failed to submit form: {0}")]
    PersistenceFailed(#[from] RecordSinkError),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Too many requests")]
    TooManyRequests,
    #[error("Request timed out")]
    RequestTimeout,
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Short, stable label used for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MalformedInput(_) => "malformed_input",
            Self::MissingField(_) => "missing_field",
            Self::SpamRejected => "spam_rejected",
            Self::PersistenceFailed(_) => "persistence_failed",
            Self::PayloadTooLarge => "payload_too_large",
            Self::TooManyRequests => "too_many_requests",
            Self::RequestTimeout => "request_timeout",
            Self::Internal => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MethodNotAllowed => {
                tracing::debug!("Method not allowed");
                (StatusCode::METHOD_NOT_ALLOWED, json!({ "error": "Method not allowed" }))
            }
            Self::MalformedInput(msg) => {
                tracing::debug!(message = %msg, "Malformed input");
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            Self::MissingField(field) => {
                let msg = format!("Missing required field: {field}");
                tracing::debug!(message = %msg, "Missing field");
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            Self::SpamRejected => {
                tracing::info!("Honeypot field filled, submission rejected");
                (StatusCode::BAD_REQUEST, json!({ "error": "Submission rejected" }))
            }
            Self::PersistenceFailed(e) => {
                tracing::error!(error = %e, "Record store rejected submission");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Failed to submit form", "details": e.to_string() }))
            }
            Self::PayloadTooLarge => {
                tracing::debug!("Request body too large");
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": "Request body too large" }))
            }
            Self::TooManyRequests => {
                tracing::debug!("Rate limit exceeded");
                (StatusCode::TOO_MANY_REQUESTS, json!({ "error": "Too many requests" }))
            }
            Self::RequestTimeout => {
                tracing::warn!("Request timed out");
                (StatusCode::REQUEST_TIMEOUT, json!({ "error": "Request timed out" }))
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MethodNotAllowed.into_response().status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(AppError::MissingField("email").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::SpamRejected.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::RequestTimeout.into_response().status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            AppError::PersistenceFailed(RecordSinkError::Transport("connection refused".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_field_message_names_field() {
        assert_eq!(AppError::MissingField("fullName").to_string(), "Missing required field: fullName");
    }
}
