//! # Fleet Live
//!
//! Host process for the live fleet dashboard engine. It wires the
//! `fleet-state` session to a TCP push stream, probes the secondary service
//! over HTTP, and serves the read API.

pub mod config;
pub mod http;
pub mod provider;
pub mod transport;

use anyhow::{Context, Result};
use fleet_state::{RunOutcome, Session};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use self::config::HostConfig;
pub use self::http::{AppState, router};
pub use self::provider::HostProvider;
pub use self::transport::TcpTransport;

const SERVICE: &str = "fleet-live";

/// Run the host until `shutdown` is cancelled.
///
/// The read API starts as soon as the session exists. The stream is
/// reconnected after `reconnect_delay` whenever it drops; while waiting the
/// session keeps probing and accepting operator commands.
///
/// # Errors
///
/// Returns an error when no operator is signed in, or the read API cannot
/// bind its listen address.
pub async fn run(
    host: HostConfig, config: fleet_state::Config, shutdown: CancellationToken,
) -> Result<()> {
    let provider = HostProvider::from_env()?;
    let transport = TcpTransport::new(host.stream_addr.clone());
    let mut session =
        Session::start(config, transport, provider).await.context("starting session")?;

    let listener = TcpListener::bind(host.http_addr)
        .await
        .with_context(|| format!("binding read API on {}", host.http_addr))?;
    info!(addr = %host.http_addr, service = %SERVICE, "read API listening");

    let app = router(AppState::for_session(&session));
    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).with_graceful_shutdown(server_shutdown.cancelled_owned()).await
    });

    loop {
        match session.connect().await {
            Ok(epoch) => {
                info!(epoch = %epoch, addr = %host.stream_addr, service = %SERVICE, "streaming");
                if session.run(shutdown.cancelled()).await == RunOutcome::Shutdown {
                    break;
                }
            }
            Err(e) => {
                warn!(monotonic_counter.reconnects = 1, error = %e, service = %SERVICE);
            }
        }

        // wait out the delay on the session loop so probes and commands still run
        let delay = tokio::time::sleep(host.reconnect_delay);
        session
            .run(async {
                tokio::select! {
                    () = shutdown.cancelled() => {}
                    () = delay => {}
                }
            })
            .await;
        if shutdown.is_cancelled() {
            break;
        }
    }

    session.teardown().await;
    shutdown.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, service = %SERVICE, "read API failed"),
        Err(e) => error!(error = %e, service = %SERVICE, "read API task panicked"),
    }
    info!(service = %SERVICE, "stopped");

    Ok(())
}
