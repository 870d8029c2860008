use crate::config::{MailConfig, MailProviderKind};
use crate::services::notification::provider::{MailError, MailProvider};
use std::sync::Arc;

pub mod sendgrid;
pub mod smtp;

/// Builds the provider selected by configuration, or `None` when mail is disabled.
///
/// # Errors
/// Returns `MailError::MissingConfig` or `MailError::InvalidAddress` when the selected
/// provider lacks credentials or a usable sender address.
pub fn build_provider(config: &MailConfig) -> Result<Option<Arc<dyn MailProvider>>, MailError> {
    let provider: Arc<dyn MailProvider> = match config.mail_provider {
        MailProviderKind::Disabled => return Ok(None),
        MailProviderKind::Smtp => Arc::new(smtp::SmtpProvider::new(config)?),
        MailProviderKind::Sendgrid => Arc::new(sendgrid::SendGridProvider::new(config)?),
    };

    if config.operator_recipients().is_empty() {
        tracing::warn!(provider = provider.name(), "ADMIN_EMAILS is empty, lead alerts will not be sent");
    }

    Ok(Some(provider))
}
