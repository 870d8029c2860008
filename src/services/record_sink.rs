use crate::domain::submission::{RecordId, SubmissionRecord};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordSinkError {
    #[error("Record store returned status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Record store returned an unreadable response (status {status}): {body}")]
    InvalidResponse { status: u16, body: String },
    #[error("Record store request failed: {0}")]
    Transport(String),
    #[error("Record store request timed out after {0:?}")]
    Timeout(Duration),
}

impl RecordSinkError {
    /// The upstream HTTP status, when the store answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::InvalidResponse { status, .. } => Some(*status),
            Self::Transport(_) | Self::Timeout(_) => None,
        }
    }
}

#[async_trait]
pub trait RecordSink: Send + Sync + std::fmt::Debug {
    /// Creates one record in the store. A single attempt is made.
    ///
    /// # Errors
    /// Returns `RecordSinkError::Rejected` for any non-2xx answer, `InvalidResponse` when the
    /// body lacks a record id, and `Transport` or `Timeout` when the store could not be reached.
    async fn persist(&self, record: &SubmissionRecord) -> Result<RecordId, RecordSinkError>;
}
