use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Sent to the person who filled in the form.
    Confirmation,
    /// Sent to the operators who follow up on leads.
    Alert,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmation => "confirmation",
            Self::Alert => "alert",
        }
    }
}

/// A rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub kind: NotificationKind,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Result of the notification step. Never an error: a failed send is recorded here
/// and the submission itself still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    #[must_use]
    pub const fn sent() -> Self {
        Self { sent: true, error: None }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self { sent: false, error: Some(error.into()) }
    }

    #[must_use]
    pub fn not_configured() -> Self {
        Self::failed("not configured")
    }
}
