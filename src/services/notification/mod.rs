use crate::config::MailConfig;
use crate::domain::notification::{NotificationMessage, NotificationOutcome};
use crate::domain::submission::{RecordId, SubmissionRecord};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

pub mod provider;
pub mod templates;

use provider::MailProvider;
use templates::Branding;

#[derive(Clone, Debug)]
struct Metrics {
    sends_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("lead-intake-server");
        Self {
            sends_total: meter
                .u64_counter("lead_notifications_total")
                .with_description("Notification send attempts by message kind and status")
                .build(),
        }
    }
}

/// Sends the confirmation and alert emails for a persisted submission.
///
/// Delivery is advisory: every failure is folded into the returned
/// [`NotificationOutcome`] and never reaches the caller as an error.
#[derive(Clone, Debug)]
pub struct NotificationDispatcher {
    provider: Option<Arc<dyn MailProvider>>,
    operators: Vec<String>,
    branding: Branding,
    send_timeout: Duration,
    metrics: Metrics,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(provider: Option<Arc<dyn MailProvider>>, config: &MailConfig) -> Self {
        let contact_address =
            config.mail_contact.clone().or_else(|| config.sender_address().map(str::to_string));
        Self {
            provider,
            operators: config.operator_recipients(),
            branding: Branding { name: config.mail_from_name.clone(), contact_address },
            send_timeout: Duration::from_secs(config.mail_timeout_secs),
            metrics: Metrics::new(),
        }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Sends the submitter confirmation, then the operator alert.
    ///
    /// Both sends are attempted even if the first one fails. Without operator
    /// recipients the alert cannot be sent, which is reported like a failed send.
    #[tracing::instrument(skip_all, fields(record_id = %record_id))]
    pub async fn notify(&self, record: &SubmissionRecord, record_id: &RecordId) -> NotificationOutcome {
        let Some(provider) = &self.provider else {
            tracing::debug!("No mail provider configured, skipping notifications");
            return NotificationOutcome::not_configured();
        };

        let mut errors = Vec::new();

        let confirmation = templates::confirmation(record, &self.branding);
        if let Err(e) = self.deliver(provider.as_ref(), &confirmation).await {
            errors.push(e);
        }

        if self.operators.is_empty() {
            tracing::warn!("No operator recipients configured, skipping lead alert");
            errors.push("alert email skipped: no operator recipients configured".to_string());
        } else {
            let alert = templates::alert(record, record_id, &self.operators, &self.branding);
            if let Err(e) = self.deliver(provider.as_ref(), &alert).await {
                errors.push(e);
            }
        }

        if errors.is_empty() { NotificationOutcome::sent() } else { NotificationOutcome::failed(errors.join("; ")) }
    }

    async fn deliver(&self, provider: &dyn MailProvider, message: &NotificationMessage) -> Result<(), String> {
        let kind = message.kind.as_str();
        let result = match timeout(self.send_timeout, provider.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{kind} email failed: {e}")),
            Err(_) => Err(format!("{kind} email timed out after {}s", self.send_timeout.as_secs())),
        };

        match &result {
            Ok(()) => {
                tracing::info!(kind, provider = provider.name(), recipients = message.to.len(), "Notification sent");
                self.metrics.sends_total.add(1, &[KeyValue::new("kind", kind), KeyValue::new("status", "success")]);
            }
            Err(e) => {
                tracing::warn!(kind, provider = provider.name(), error = %e, "Notification failed");
                self.metrics.sends_total.add(1, &[KeyValue::new("kind", kind), KeyValue::new("status", "failure")]);
            }
        }

        result
    }
}
