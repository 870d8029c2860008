use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Tag stored with every record created by this service.
pub const LEAD_SOURCE: &str = "Website Contact Form";

/// The products a submitter is interested in, in the order they were given.
///
/// Always a sequence: a single product becomes a one-element list, and an absent
/// or blank value becomes an empty list rather than null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProductInterest(Vec<String>);

impl ProductInterest {
    /// Builds the list from raw entries, trimming each one and dropping blanks.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(items.into_iter().map(|s| s.as_ref().trim().to_string()).filter(|s| !s.is_empty()).collect())
    }

    #[must_use]
    pub fn single(product: &str) -> Self {
        Self::new([product])
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Human-readable form used in message bodies.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

/// A validated contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub products: ProductInterest,
    pub message: String,
}

/// Identifier assigned by the record store to a created record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The form of a submission that is written to the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub products: ProductInterest,
    pub message: String,
    pub lead_source: &'static str,
    pub submitted_at: OffsetDateTime,
}

impl SubmissionRecord {
    /// Stamps a validated submission. Optional fields default to the empty string and
    /// the timestamp is truncated to millisecond precision.
    #[must_use]
    pub fn from_input(input: SubmissionInput, submitted_at: OffsetDateTime) -> Self {
        let submitted_at = submitted_at.replace_millisecond(submitted_at.millisecond()).unwrap_or(submitted_at);
        Self {
            full_name: input.full_name,
            email: input.email,
            phone: input.phone.unwrap_or_default(),
            company: input.company.unwrap_or_default(),
            products: input.products,
            message: input.message,
            lead_source: LEAD_SOURCE,
            submitted_at,
        }
    }

    /// The submission time as an ISO-8601 / RFC 3339 string in UTC.
    #[must_use]
    pub fn submitted_at_iso(&self) -> String {
        self.submitted_at
            .to_offset(time::UtcOffset::UTC)
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.submitted_at.unix_timestamp().to_string())
    }
}
