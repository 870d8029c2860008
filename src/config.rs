use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A credential read from the environment. Its `Debug` output is redacted so that
/// configuration can be logged without leaking keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Comma-separated list of accepted product names (empty accepts any product)
    #[arg(long, env = "LEAD_ALLOWED_PRODUCTS", value_delimiter = ',')]
    pub allowed_products: Vec<String>,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub record_store: RecordStoreConfig,

    #[command(flatten)]
    pub mail: MailConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "LEAD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "LEAD_PORT", default_value_t = 8080)]
    pub port: u16,

    /// How long to wait for in-flight requests during shutdown
    #[arg(long, env = "LEAD_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Upper bound on the total time spent handling a single request. Must exceed the
    /// store timeout plus two mail timeouts.
    #[arg(long, env = "LEAD_REQUEST_TIMEOUT_SECS", default_value_t = 45)]
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "LEAD_MAX_BODY_BYTES", default_value_t = 65_536)]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 10,
            request_timeout_secs: 45,
            max_body_bytes: 65_536,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Submissions per second allowed per client IP
    #[arg(long, env = "LEAD_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub per_second: u32,

    /// Burst allowance per client IP
    #[arg(long, env = "LEAD_RATE_LIMIT_BURST", default_value_t = 5)]
    pub burst: u32,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "LEAD_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let trusted_proxies = ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "127.0.0.1/32"]
            .iter()
            .filter_map(|cidr| cidr.parse().ok())
            .collect();
        Self { per_second: 1, burst: 5, trusted_proxies }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RecordStoreConfig {
    /// Airtable personal access token
    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    pub airtable_api_key: Secret,

    /// Airtable API base URL
    #[arg(long, env = "LEAD_AIRTABLE_BASE_URL", default_value = "https://api.airtable.com")]
    pub airtable_base_url: String,

    /// Airtable base identifier
    #[arg(long, env = "LEAD_AIRTABLE_BASE_ID", default_value = "apptu7Bf35Da3H3wD")]
    pub airtable_base_id: String,

    /// Airtable table name
    #[arg(long, env = "LEAD_AIRTABLE_TABLE_NAME", default_value = "Request form")]
    pub airtable_table_name: String,

    /// Timeout for a single record creation call
    #[arg(long, env = "LEAD_AIRTABLE_TIMEOUT_SECS", default_value_t = 10)]
    pub airtable_timeout_secs: u64,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            airtable_api_key: Secret::default(),
            airtable_base_url: "https://api.airtable.com".to_string(),
            airtable_base_id: "apptu7Bf35Da3H3wD".to_string(),
            airtable_table_name: "Request form".to_string(),
            airtable_timeout_secs: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MailProviderKind {
    /// Notifications are skipped
    #[default]
    #[value(name = "none")]
    Disabled,
    /// Authenticated SMTP (Gmail, Zoho, ...)
    Smtp,
    /// `SendGrid` HTTP API
    Sendgrid,
}

#[derive(Clone, Debug, Args)]
pub struct MailConfig {
    /// Which messaging provider delivers notifications
    #[arg(long, env = "LEAD_MAIL_PROVIDER", value_enum, default_value_t = MailProviderKind::Disabled)]
    pub mail_provider: MailProviderKind,

    /// SMTP relay host
    #[arg(long, env = "LEAD_SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP port (465 for implicit TLS, 587 for STARTTLS)
    #[arg(long, env = "LEAD_SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// Use STARTTLS instead of implicit TLS
    #[arg(long, env = "LEAD_SMTP_STARTTLS", default_value_t = false)]
    pub smtp_starttls: bool,

    /// SMTP username
    #[arg(long, env = "GMAIL_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password or app password
    #[arg(long, env = "GMAIL_PASS", hide_env_values = true)]
    pub smtp_password: Option<Secret>,

    /// `SendGrid` API key
    #[arg(long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    pub sendgrid_api_key: Option<Secret>,

    /// `SendGrid` API base URL
    #[arg(long, env = "LEAD_SENDGRID_BASE_URL", default_value = "https://api.sendgrid.com")]
    pub sendgrid_base_url: String,

    /// Sender address (falls back to the SMTP username)
    #[arg(long, env = "LEAD_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Sender display name, also used as the brand in message bodies
    #[arg(long, env = "LEAD_MAIL_FROM_NAME", default_value = "Snowdon23 AgroTrade")]
    pub mail_from_name: String,

    /// Address submitters are told to contact (falls back to the sender address)
    #[arg(long, env = "LEAD_MAIL_CONTACT")]
    pub mail_contact: Option<String>,

    /// Comma-separated list of operator addresses that receive lead alerts
    #[arg(long, env = "ADMIN_EMAILS", value_delimiter = ',')]
    pub admin_emails: Vec<String>,

    /// Timeout for a single outbound message
    #[arg(long, env = "LEAD_MAIL_TIMEOUT_SECS", default_value_t = 10)]
    pub mail_timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mail_provider: MailProviderKind::Disabled,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            smtp_starttls: false,
            smtp_user: None,
            smtp_password: None,
            sendgrid_api_key: None,
            sendgrid_base_url: "https://api.sendgrid.com".to_string(),
            mail_from: None,
            mail_from_name: "Snowdon23 AgroTrade".to_string(),
            mail_contact: None,
            admin_emails: Vec::new(),
            mail_timeout_secs: 10,
        }
    }
}

impl MailConfig {
    /// The configured sender address, falling back to the SMTP username.
    #[must_use]
    pub fn sender_address(&self) -> Option<&str> {
        self.mail_from
            .as_deref()
            .or(self.smtp_user.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Operator recipients, trimmed, with blanks and duplicates removed. Order is preserved.
    #[must_use]
    pub fn operator_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = Vec::with_capacity(self.admin_emails.len());
        for email in self.admin_emails.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
            if !recipients.iter().any(|r| r.eq_ignore_ascii_case(email)) {
                recipients.push(email.to_string());
            }
        }
        recipients
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "LEAD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; tracing and metrics export is disabled when unset
    #[arg(long, env = "LEAD_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Worst case for one submission when every external call runs into its own timeout:
    /// one store call, then the confirmation and the alert.
    #[must_use]
    pub const fn pipeline_budget_secs(&self) -> u64 {
        self.record_store.airtable_timeout_secs.saturating_add(self.mail.mail_timeout_secs.saturating_mul(2))
    }

    /// Allowed products, trimmed and without blanks. Empty means any product is accepted.
    #[must_use]
    pub fn product_allowlist(&self) -> Vec<String> {
        self.allowed_products.iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("patABC123");
        assert_eq!(format!("{secret:?}"), "Secret([REDACTED])");
        assert_eq!(secret.expose(), "patABC123");
    }

    #[test]
    fn test_operator_recipients_trimmed_and_deduplicated() {
        let config = MailConfig {
            admin_emails: vec![
                " ops@example.com".into(),
                "sales@example.com ".into(),
                "".into(),
                "OPS@example.com".into(),
            ],
            ..MailConfig::default()
        };
        assert_eq!(config.operator_recipients(), vec!["ops@example.com", "sales@example.com"]);
    }

    #[test]
    fn test_sender_falls_back_to_smtp_user() {
        let mut config = MailConfig { smtp_user: Some("bot@gmail.com".into()), ..MailConfig::default() };
        assert_eq!(config.sender_address(), Some("bot@gmail.com"));

        config.mail_from = Some("leads@example.com".into());
        assert_eq!(config.sender_address(), Some("leads@example.com"));
    }

    #[test]
    fn test_parse_from_flags() {
        let config = Config::try_parse_from([
            "lead-intake-server",
            "--airtable-api-key",
            "key",
            "--mail-provider",
            "sendgrid",
            "--admin-emails",
            "a@example.com,b@example.com",
            "--allowed-products",
            "Cocoa, Cashew",
        ])
        .expect("flags parse");

        assert_eq!(config.mail.mail_provider, MailProviderKind::Sendgrid);
        assert_eq!(config.mail.admin_emails.len(), 2);
        assert_eq!(config.product_allowlist(), vec!["Cocoa", "Cashew"]);
        assert_eq!(config.record_store.airtable_table_name, "Request form");
    }

    #[test]
    fn test_default_request_timeout_covers_pipeline() {
        let config = Config::default();
        assert_eq!(config.pipeline_budget_secs(), 30);
        assert!(config.server.request_timeout_secs > config.pipeline_budget_secs());
    }
}
