//! HTTP server lifecycle: bind, serve, drain on shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::comics::ComicClient;
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::utils::{force_signal, shutdown_signal};

/// How the drain after a shutdown signal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// In-flight requests finished in time.
    Completed,
    /// The shutdown timeout elapsed.
    TimedOut,
    /// A second interrupt arrived.
    Forced,
}

/// The comic API server.
pub struct Server {
    address: String,
    port: u16,
    shutdown_timeout: Duration,
    router: Router,
}

impl Server {
    /// Build the client, state and router from the configuration.
    pub fn new(config: &Config, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let client = ComicClient::new(&config.upstream_url)?;

        let mut state = AppState::new(client);
        if let Some(handle) = metrics {
            state = state.with_metrics(handle);
        }

        let cors = config.cors_layer().map_err(ServiceError::InvalidConfig)?;

        Ok(Self {
            address: config.server_address.clone(),
            port: config.server_port,
            shutdown_timeout: config.shutdown_timeout(),
            router: create_router(state, cors),
        })
    }

    /// Serve until SIGINT/SIGTERM, then drain for at most the shutdown timeout.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind((self.address.as_str(), self.port)).await?;
        info!("HTTP server listening on {}", listener.local_addr()?);

        let (signal_tx, mut signal_rx) = watch::channel(false);

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    let _ = signal_tx.send(true);
                })
                .await
        });

        tokio::select! {
            joined = &mut server => {
                // Server stopped on its own, before any signal.
                joined??;
                return Ok(());
            }
            _ = signal_rx.changed() => {}
        }

        info!("Shutting down gracefully, press Ctrl+C again to force");

        match drain(&mut server, self.shutdown_timeout, force_signal()).await? {
            Drain::Completed => {}
            Drain::TimedOut => warn!(
                timeout_secs = self.shutdown_timeout.as_secs(),
                "Server forced to shutdown"
            ),
            Drain::Forced => warn!("Received Ctrl+C again, forcing shutdown"),
        }

        info!("Server exiting");
        Ok(())
    }
}

/// Wait for the server task to finish, aborting it on timeout or on `force`.
async fn drain<F>(
    server: &mut JoinHandle<std::io::Result<()>>,
    timeout: Duration,
    force: F,
) -> Result<Drain>
where
    F: Future<Output = ()>,
{
    let outcome = tokio::select! {
        joined = tokio::time::timeout(timeout, &mut *server) => joined.map_err(|_| Drain::TimedOut),
        _ = force => Err(Drain::Forced),
    };

    match outcome {
        Ok(joined) => {
            joined??;
            Ok(Drain::Completed)
        }
        Err(reason) => {
            server.abort();
            Ok(reason)
        }
    }
}
