//! Runs a single BigQuery query per request: `GET /?query=<sql>&project=<project id>`.
//!
//! Configured through the environment:
//! - `GCP_SERVICE_ACCOUNT`: the service account key JSON (required)
//! - `PORT`: defaults to 8080
//! - `TOKEN_CACHE_TTL_SECS`: how long an access token is reused, defaults to 3600
//! - `BIGQUERY_BASE_URL`: overrides the BigQuery REST endpoint, e.g. for an emulator
//! - `RUST_LOG`: log filter, defaults to `info`

#[macro_use]
extern crate tracing;

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod handler;
mod kv;

use config::Config;
use handler::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = Config::from_env()?;
    let state = AppState::new(&config)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        message = "listening",
        %addr,
        client_email = config.credential.client_email(),
        token_cache_ttl_secs = config.token_cache_ttl.as_secs(),
    );

    axum::serve(listener, handler::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(message = "shut down");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(message = "error listening for ctrl-c", ?error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            // without a handler, never resolve rather than shutting down right away
            Err(error) => {
                error!(message = "error setting up SIGTERM handler", ?error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(message = "shutdown signal received, draining connections");
}
