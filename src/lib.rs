#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::airtable::AirtableClient;
use crate::config::Config;
use crate::services::notification::NotificationDispatcher;
use crate::services::notification::provider::MailProvider;
use crate::services::record_sink::RecordSink;
use crate::services::submission_service::SubmissionService;
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wires configuration and collaborators into the HTTP router.
///
/// Collaborators not supplied explicitly are built from configuration: the Airtable
/// client as the record sink and the configured mail provider, if any.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    record_sink: Option<Arc<dyn RecordSink>>,
    mail_provider: Option<Option<Arc<dyn MailProvider>>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, record_sink: None, mail_provider: None }
    }

    #[must_use]
    pub fn with_record_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.record_sink = Some(sink);
        self
    }

    /// Overrides the mail provider. `None` disables notifications.
    #[must_use]
    pub fn with_mail_provider(mut self, provider: Option<Arc<dyn MailProvider>>) -> Self {
        self.mail_provider = Some(provider);
        self
    }

    /// # Errors
    /// Returns an error if a collaborator cannot be built from configuration.
    pub fn build(self) -> anyhow::Result<axum::Router> {
        let config = self.config;

        let budget = config.pipeline_budget_secs();
        if config.server.request_timeout_secs <= budget {
            return Err(anyhow!(
                "LEAD_REQUEST_TIMEOUT_SECS ({}s) must exceed the store timeout plus two mail timeouts ({budget}s)",
                config.server.request_timeout_secs
            ));
        }

        let record_sink = match self.record_sink {
            Some(sink) => sink,
            None => Arc::new(AirtableClient::new(&config.record_store)?),
        };
        let mail_provider = match self.mail_provider {
            Some(provider) => provider,
            None => adapters::mail::build_provider(&config.mail)?,
        };

        let dispatcher = NotificationDispatcher::new(mail_provider, &config.mail);
        if !dispatcher.is_configured() {
            tracing::warn!("No mail provider configured, submissions will be stored without notifications");
        }

        let submission_service = SubmissionService::new(
            record_sink,
            dispatcher,
            Duration::from_secs(config.record_store.airtable_timeout_secs),
        );

        api::app_router(&config, submission_service)
    }
}

/// Routes panics through `tracing` before the default hook runs.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "Process panicked");
        default_hook(info);
    }));
}

/// Flips `shutdown_tx` to `true` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received terminate signal, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    fn config() -> Config {
        let mut config = Config::default();
        config.record_store.airtable_api_key = Secret::new("key");
        config
    }

    #[test]
    fn test_builds_with_defaults() {
        assert!(AppBuilder::new(config()).build().is_ok());
    }

    #[test]
    fn test_request_timeout_must_cover_pipeline() {
        let mut config = config();
        config.record_store.airtable_timeout_secs = 10;
        config.mail.mail_timeout_secs = 10;
        config.server.request_timeout_secs = 30;

        let err = AppBuilder::new(config).build().unwrap_err();
        assert!(err.to_string().contains("LEAD_REQUEST_TIMEOUT_SECS"), "{err}");
    }
}
