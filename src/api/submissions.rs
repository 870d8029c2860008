use crate::api::AppState;
use crate::api::schemas::submission::validate_request;
use crate::domain::pipeline::PipelineResult;
use crate::error::{AppError, Result};
use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{Method, StatusCode},
};

/// Accepts a contact form submission.
///
/// # Errors
/// Returns `AppError::MethodNotAllowed` for non-POST requests and a 400-class error
/// when the payload is invalid. Persistence failures are carried in the returned
/// `PipelineResult` and rendered as 500.
pub async fn submit_form(
    State(state): State<AppState>,
    method: Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<PipelineResult> {
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::MalformedInput(rejection.body_text())
        }
    })?;

    let input = validate_request(&body, &state.allowed_products).inspect_err(|e| {
        tracing::debug!(reason = e.kind(), "Submission failed validation");
    })?;

    Ok(state.submission_service.submit(input).await)
}
