use crate::domain::pipeline::PipelineResult;
use crate::domain::submission::{SubmissionInput, SubmissionRecord};
use crate::error::AppError;
use crate::services::notification::NotificationDispatcher;
use crate::services::record_sink::{RecordSink, RecordSinkError};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::timeout;

#[derive(Clone, Debug)]
struct Metrics {
    submissions_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("lead-intake-server");
        Self {
            submissions_total: meter
                .u64_counter("lead_submissions_total")
                .with_description("Validated submissions by persistence outcome")
                .build(),
        }
    }
}

/// Runs a validated submission through the record store and the notification step.
#[derive(Clone, Debug)]
pub struct SubmissionService {
    sink: Arc<dyn RecordSink>,
    dispatcher: NotificationDispatcher,
    persist_timeout: Duration,
    metrics: Metrics,
}

impl SubmissionService {
    #[must_use]
    pub fn new(sink: Arc<dyn RecordSink>, dispatcher: NotificationDispatcher, persist_timeout: Duration) -> Self {
        Self { sink, dispatcher, persist_timeout, metrics: Metrics::new() }
    }

    /// Persists the submission and then, only if that succeeded, sends notifications.
    ///
    /// A persistence failure ends the pipeline with no notification attempt. A
    /// notification failure is recorded in the result but does not fail it.
    #[tracing::instrument(skip_all, fields(submission_id = %uuid::Uuid::new_v4()))]
    pub async fn submit(&self, input: SubmissionInput) -> PipelineResult {
        let record = SubmissionRecord::from_input(input, OffsetDateTime::now_utc());

        let persisted = match timeout(self.persist_timeout, self.sink.persist(&record)).await {
            Ok(result) => result,
            Err(_) => Err(RecordSinkError::Timeout(self.persist_timeout)),
        };

        let record_id = match persisted {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, upstream_status = ?e.status(), "Submission was not stored");
                self.metrics.submissions_total.add(1, &[KeyValue::new("status", "failure")]);
                return PipelineResult::failed(AppError::PersistenceFailed(e));
            }
        };

        tracing::info!(record_id = %record_id, products = record.products.len(), "Submission stored");
        self.metrics.submissions_total.add(1, &[KeyValue::new("status", "success")]);

        let notification = self.dispatcher.notify(&record, &record_id).await;
        if let Some(error) = &notification.error {
            tracing::debug!(error = %error, "Submission stored without notification");
        }

        PipelineResult::persisted(record_id, notification)
    }
}
