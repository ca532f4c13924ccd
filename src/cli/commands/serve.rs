use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::{MemoryStore, PgStore, Store};
use crate::services::WebhookForwarder;

pub async fn handle(mut config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let store = open_store(&config, memory).await?;
    let webhook = WebhookForwarder::from_config(&config.webhook)?;
    if webhook.is_enabled() {
        tracing::info!("Forwarding intake events to the configured webhook");
    }

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Finance intake API listening on http://{}", bind_addr);

    let router = app(AppState::new(store, config, webhook));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(config: &AppConfig, memory: bool) -> anyhow::Result<Arc<dyn Store>> {
    if memory || config.database.url.is_none() {
        tracing::warn!("Using the in-memory store; records are lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(&config.database)
        .await
        .context("Failed to open the PostgreSQL store")?;
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
