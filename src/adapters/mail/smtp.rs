use crate::config::MailConfig;
use crate::domain::notification::NotificationMessage;
use crate::services::notification::provider::{MailError, MailProvider};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use std::time::Duration;

/// Sends mail through an authenticated SMTP relay such as Gmail or Zoho.
pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    from: Mailbox,
}

impl fmt::Debug for SmtpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpProvider").field("host", &self.host).field("from", &self.from.to_string()).finish()
    }
}

impl SmtpProvider {
    /// Configures a pooled TLS transport. No connection is made until the first send.
    ///
    /// # Errors
    /// Returns `MailError::MissingConfig` if the username, password, or sender is absent,
    /// and `MailError::InvalidAddress` if the sender does not parse.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let user = config
            .smtp_user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(MailError::MissingConfig("GMAIL_USER"))?;
        let password =
            config.smtp_password.as_ref().filter(|p| !p.is_empty()).ok_or(MailError::MissingConfig("GMAIL_PASS"))?;
        let from = sender_mailbox(config)?;

        let builder = if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(user, password.expose().to_string()))
            .timeout(Some(Duration::from_secs(config.mail_timeout_secs)))
            .build();

        Ok(Self { transport, host: config.smtp_host.clone(), from })
    }
}

/// The configured sender as a mailbox with the brand as display name.
pub(crate) fn sender_mailbox(config: &MailConfig) -> Result<Mailbox, MailError> {
    let sender = config.sender_address().ok_or(MailError::MissingConfig("LEAD_MAIL_FROM"))?;
    let address: Address = sender.parse().map_err(|e| MailError::InvalidAddress(format!("{sender}: {e}")))?;
    Ok(Mailbox::new(Some(config.mail_from_name.clone()), address))
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e| MailError::InvalidAddress(format!("{address}: {e}")))
}

pub(crate) fn build_message(from: &Mailbox, message: &NotificationMessage) -> Result<Message, MailError> {
    let mut builder =
        Message::builder().from(from.clone()).subject(message.subject.clone()).header(ContentType::TEXT_HTML);
    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }
    builder.body(message.html_body.clone()).map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl MailProvider for SmtpProvider {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), MailError> {
        let email = build_message(&self.from, message)?;
        self.transport.send(email).await.map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationKind;

    fn message(to: Vec<&str>) -> NotificationMessage {
        NotificationMessage {
            kind: NotificationKind::Alert,
            to: to.into_iter().map(String::from).collect(),
            reply_to: Some("buyer@example.com".into()),
            subject: "New form submission from Ada".into(),
            html_body: "<p>hello</p>".into(),
        }
    }

    fn from() -> Mailbox {
        sender_mailbox(&MailConfig { mail_from: Some("leads@example.com".into()), ..MailConfig::default() }).unwrap()
    }

    #[test]
    fn test_sender_uses_brand_name() {
        let from = from().to_string();
        assert!(from.contains("Snowdon23 AgroTrade"), "{from}");
        assert!(from.ends_with("<leads@example.com>"), "{from}");
    }

    #[test]
    fn test_build_message_headers() {
        let email = build_message(&from(), &message(vec!["ops@example.com", "sales@example.com"])).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("To: ops@example.com"), "{raw}");
        assert!(raw.contains("sales@example.com"), "{raw}");
        assert!(raw.contains("Reply-To: buyer@example.com"), "{raw}");
        assert!(raw.contains("Content-Type: text/html"), "{raw}");
        assert!(raw.contains("Subject: New form submission from Ada"), "{raw}");
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let err = build_message(&from(), &message(vec!["not-an-address"])).unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
    }
}
