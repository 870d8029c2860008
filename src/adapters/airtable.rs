use crate::config::{RecordStoreConfig, Secret};
use crate::domain::submission::{ProductInterest, RecordId, SubmissionRecord};
use crate::services::record_sink::{RecordSink, RecordSinkError};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    fields: RecordFields<'a>,
}

#[derive(Serialize)]
struct RecordFields<'a> {
    #[serde(rename = "Full Name")]
    full_name: &'a str,
    #[serde(rename = "Email Address")]
    email: &'a str,
    #[serde(rename = "Phone Number")]
    phone: &'a str,
    #[serde(rename = "Company Name")]
    company: &'a str,
    #[serde(rename = "Interested Products")]
    products: &'a ProductInterest,
    #[serde(rename = "Message / Request")]
    message: &'a str,
    #[serde(rename = "Lead Source")]
    lead_source: &'a str,
    #[serde(rename = "Date Submitted")]
    submitted_at: String,
}

impl<'a> From<&'a SubmissionRecord> for RecordFields<'a> {
    fn from(record: &'a SubmissionRecord) -> Self {
        Self {
            full_name: &record.full_name,
            email: &record.email,
            phone: &record.phone,
            company: &record.company,
            products: &record.products,
            message: &record.message,
            lead_source: record.lead_source,
            submitted_at: record.submitted_at_iso(),
        }
    }
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: String,
}

/// Creates one Airtable row per submission through the REST API.
#[derive(Clone, Debug)]
pub struct AirtableClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Secret,
    timeout: Duration,
}

impl AirtableClient {
    /// Builds a client for `<base_url>/v0/<base_id>/<table_name>`.
    ///
    /// # Errors
    /// Returns an error if the API key is empty, the base URL is invalid, or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &RecordStoreConfig) -> anyhow::Result<Self> {
        if config.airtable_api_key.is_empty() {
            return Err(anyhow!("AIRTABLE_API_KEY must not be empty"));
        }

        let mut endpoint = Url::parse(&config.airtable_base_url)
            .with_context(|| format!("Invalid Airtable base URL: {}", config.airtable_base_url))?;
        endpoint
            .path_segments_mut()
            .map_err(|()| anyhow!("Airtable base URL cannot carry a path: {}", config.airtable_base_url))?
            .pop_if_empty()
            .extend(["v0", config.airtable_base_id.as_str(), config.airtable_table_name.as_str()]);

        let timeout = Duration::from_secs(config.airtable_timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build().context("Failed to build HTTP client")?;

        Ok(Self { client, endpoint, api_key: config.airtable_api_key.clone(), timeout })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RecordSink for AirtableClient {
    #[tracing::instrument(err(level = "warn"), skip_all, fields(endpoint = %self.endpoint))]
    async fn persist(&self, record: &SubmissionRecord) -> Result<RecordId, RecordSinkError> {
        let payload = CreateRecordRequest { fields: RecordFields::from(record) };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(RecordSinkError::Rejected { status: status.as_u16(), body });
        }

        let created: CreatedRecord = serde_json::from_str(&body)
            .map_err(|_| RecordSinkError::InvalidResponse { status: status.as_u16(), body: body.clone() })?;

        tracing::debug!(record_id = %created.id, "Airtable record created");
        Ok(RecordId::new(created.id))
    }
}

impl AirtableClient {
    fn transport_error(&self, e: reqwest::Error) -> RecordSinkError {
        if e.is_timeout() {
            RecordSinkError::Timeout(self.timeout)
        } else {
            RecordSinkError::Transport(e.without_url().to_string())
        }
    }
}
