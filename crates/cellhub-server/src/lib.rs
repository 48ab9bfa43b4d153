//! CellHub server.
//!
//! Serves registered cells over HTTP and WebSocket.
//!
//! # Architecture
//!
//! The server consists of:
//! - **Routes**: headless invocation on `/`, batch execution, listings
//! - **Session**: one interactive state machine per WebSocket connection
//! - **Protocol**: client/server message types
//! - **Companion**: client for the companion backend, plus a liveness probe
//! - **Stats**: per-cell dispatch counters, fed by the dispatcher
//!
//! # Features
//!
//! - `embedded-frontend` (default): Embeds the web UI for standalone use

pub mod batch;
pub mod companion;
#[cfg(feature = "embedded-frontend")]
pub mod embedded_frontend;
pub mod error;
pub mod probe;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod stats;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cellhub_core::{Dispatcher, Registry};

pub use batch::{BatchRequest, BatchResponse, run_batch};
pub use companion::{ApiCredentials, CompanionClient, CompanionError};
pub use error::{ServerError, ServerResult};
pub use probe::{DEFAULT_PROBE_INTERVAL, ProbeStatus, StatusProbe};
pub use protocol::{ClientMessage, ServerMessage};
pub use routes::{AppState, create_router};
pub use session::ClientSession;
pub use stats::{CellStats, DispatchStats};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Companion backend to probe, if any.
    pub companion_url: Option<String>,
    /// Interval between companion probes.
    pub probe_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            companion_url: None,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Start the server over a discovered registry.
pub async fn serve(registry: Registry, config: ServerConfig) -> ServerResult<()> {
    let addr = config.addr()?;
    let dispatcher = Dispatcher::new(Arc::new(registry));

    // Probe runs for the whole server lifetime
    let probe = config
        .companion_url
        .as_ref()
        .map(|url| StatusProbe::spawn(CompanionClient::new(url.clone()), config.probe_interval));

    let mut state = AppState::new(dispatcher);
    state.companion_url = config.companion_url.clone();
    state.probe = probe.as_ref().map(StatusProbe::subscribe);
    let state = Arc::new(state);

    let app = create_router(state);

    tracing::info!("Starting CellHub server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    // Handle Ctrl+C for graceful shutdown
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });

    server.await?;

    if let Some(probe) = probe {
        probe.shutdown().await;
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
