//! Task API server binary.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use main_server::{config::Config, create_app, create_state, drain_server, init_tracing};
use task_store::{ConnectorRegistry, DaoRegistry};
use tokio::{net::TcpListener, signal, sync::oneshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("fail to load config")?;

    init_tracing(&config.logger.level, config.logger.json);

    tracing::info!(service = %config.server.service, "Starting task API server");

    let connectors = ConnectorRegistry::connect(&config.connectors)
        .await
        .context("fail to init connectors")?;
    if connectors.is_empty() {
        tracing::info!("No database connector configured");
    }
    let registry = Arc::new(DaoRegistry::new(Arc::new(connectors)));

    let state = create_state(config.clone(), registry).await?;
    let app = create_app(Arc::clone(&state));

    let addr: SocketAddr = config
        .server
        .socket_addr()
        .parse()
        .context("fail to parse server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    shutdown_signal().await;
    tracing::info!("Shutdown Server ...");
    stop_tx.send(()).ok();

    // The serve task is gone once this returns, drained or aborted.
    let drained = drain_server(server, config.server.shutdown_timeout()).await;

    state.connectors().close().await;
    drained?;

    tracing::info!("Server exiting");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        }
    }
}
