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

use lead_intake_server::config::Config;
use lead_intake_server::{AppBuilder, telemetry};
use std::net::SocketAddr;
use std::pin::pin;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    lead_intake_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router) = async {
        let app_router = AppBuilder::new(config.clone()).build()?;

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        tracing::info!(
            address = %addr,
            mail_provider = ?config.mail.mail_provider,
            table = %config.record_store.airtable_table_name,
            "listening"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        Ok::<_, anyhow::Error>((listener, app_router))
    }
    .instrument(boot_span)
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    lead_intake_server::spawn_signal_handler(shutdown_tx);

    let mut server_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = server_rx.wait_for(|&s| s).await;
        });
    let mut server = pin!(server.into_future());

    let mut signal_rx = shutdown_rx;
    tokio::select! {
        res = &mut server => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Server error");
            }
        }
        _ = signal_rx.wait_for(|&s| s) => {
            // Let in-flight submissions finish, within bounds.
            match tokio::time::timeout(Duration::from_secs(config.server.shutdown_timeout_secs), &mut server).await {
                Ok(Ok(())) => tracing::info!("Server shutdown complete"),
                Ok(Err(e)) => tracing::error!(error = %e, "Server error"),
                Err(_) => tracing::warn!("Timeout waiting for in-flight requests to finish."),
            }
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
