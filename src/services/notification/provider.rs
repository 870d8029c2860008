use crate::domain::notification::NotificationMessage;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(&'static str),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait MailProvider: Send + Sync + std::fmt::Debug {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Delivers a single rendered message.
    ///
    /// # Errors
    /// Returns a `MailError` describing why the provider did not accept the message.
    async fn send(&self, message: &NotificationMessage) -> Result<(), MailError>;
}
