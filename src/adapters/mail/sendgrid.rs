use crate::config::{MailConfig, Secret};
use crate::domain::notification::NotificationMessage;
use crate::services::notification::provider::{MailError, MailProvider};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: EmailAddress<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress<'a>>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<EmailAddress<'a>>,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

/// Sends mail through the `SendGrid` v3 HTTP API.
#[derive(Clone, Debug)]
pub struct SendGridProvider {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Secret,
    from_email: String,
    from_name: String,
}

impl SendGridProvider {
    /// # Errors
    /// Returns `MailError::MissingConfig` if the API key or sender is absent, and
    /// `MailError::Build` if the base URL is invalid.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let api_key = config
            .sendgrid_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(MailError::MissingConfig("SENDGRID_API_KEY"))?;
        let from_email = config.sender_address().ok_or(MailError::MissingConfig("LEAD_MAIL_FROM"))?.to_string();

        let endpoint = Url::parse(&config.sendgrid_base_url)
            .and_then(|base| base.join("/v3/mail/send"))
            .map_err(|e| MailError::Build(format!("invalid SendGrid base URL {}: {e}", config.sendgrid_base_url)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.mail_timeout_secs))
            .build()
            .map_err(|e| MailError::Build(e.to_string()))?;

        Ok(Self { client, endpoint, api_key, from_email, from_name: config.mail_from_name.clone() })
    }
}

#[async_trait]
impl MailProvider for SendGridProvider {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), MailError> {
        let request = SendRequest {
            personalizations: [Personalization {
                to: message.to.iter().map(|email| EmailAddress { email, name: None }).collect(),
            }],
            from: EmailAddress { email: &self.from_email, name: Some(&self.from_name) },
            reply_to: message.reply_to.as_deref().map(|email| EmailAddress { email, name: None }),
            subject: &message.subject,
            content: [Content { content_type: "text/html", value: &message.html_body }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }
}
