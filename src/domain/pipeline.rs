use crate::domain::notification::NotificationOutcome;
use crate::domain::submission::RecordId;
use crate::error::AppError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Outcome of one pass through the submission pipeline.
///
/// `record_id` is present exactly when the record store accepted the submission.
/// The notification outcome is carried alongside and never decides success.
#[derive(Debug)]
pub struct PipelineResult {
    pub record_id: Option<RecordId>,
    pub notification: NotificationOutcome,
    pub error: Option<AppError>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionResponse<'a> {
    success: bool,
    id: &'a str,
    email_sent: bool,
}

impl PipelineResult {
    #[must_use]
    pub const fn persisted(record_id: RecordId, notification: NotificationOutcome) -> Self {
        Self { record_id: Some(record_id), notification, error: None }
    }

    #[must_use]
    pub fn failed(error: AppError) -> Self {
        Self { record_id: None, notification: NotificationOutcome::failed("not attempted"), error: Some(error) }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none() && self.record_id.is_some()
    }

    #[must_use]
    pub const fn email_sent(&self) -> bool {
        self.notification.sent
    }
}

impl IntoResponse for PipelineResult {
    fn into_response(self) -> Response {
        if let Some(error) = self.error {
            return error.into_response();
        }

        let Some(record_id) = self.record_id else {
            return AppError::Internal.into_response();
        };

        let body = SubmissionResponse { success: true, id: record_id.as_str(), email_sent: self.notification.sent };
        (StatusCode::OK, Json(body)).into_response()
    }
}
