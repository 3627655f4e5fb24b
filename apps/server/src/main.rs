//! # WashWise
//!
//! Laundry machine monitor: polls the vending platform in the background and
//! serves machine status and usage history over HTTP.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load config ─► init tracing ─► open store ─► bind listener             │
//! │                                                   │                     │
//! │                     ┌─────────────────────────────┴───────────┐         │
//! │                     ▼                                         ▼         │
//! │            sync task: startup pass,                  axum::serve        │
//! │            then cadence loops                        until SIGINT/TERM  │
//! │                     │                                         │         │
//! │                     └──────────── stop + join ◄───────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure before the listener is bound is fatal. After that, sync
//! failures are logged and retried on the next tick.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use washwise_db::{Database, DbConfig};
use washwise_server::{router, AppConfig, AppState};
use washwise_sync::{QiekjClient, Scheduler, SyncEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path).context("Failed to load configuration")?;

    init_tracing(&config.log.level);
    info!(
        shops = config.sync.shops.len(),
        base_url = %config.sync.api.base_url,
        "Starting WashWise"
    );

    // Store
    if let Some(dir) = config.database.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }
    let db_config =
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections);
    let db = Database::new(db_config)
        .await
        .context("Failed to open database")?;

    // HTTP listener
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    // Sync
    let api = Arc::new(QiekjClient::new(&config.sync.api).context("Failed to build platform client")?);
    let engine = Arc::new(SyncEngine::new(api, db.clone(), &config.sync));
    let mut scheduler = Scheduler::new(engine, config.sync.cron);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let sync_task = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!(error = %e, "Scheduler failed to start");
            return;
        }
        let _ = stop_rx.await;
        scheduler.stop();
        scheduler.join().await;
    });

    // Serve
    let state = AppState::new(db.clone(), config.sync.clone());
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    let _ = stop_tx.send(());
    if let Err(e) = sync_task.await {
        error!(error = %e, "Sync task panicked");
    }
    db.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},sqlx=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
