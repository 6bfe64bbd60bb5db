//! NotiHub Server — Multi-Channel Notification Dispatch Service
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use notihub_api::AppState;
use notihub_broker::BrokerGateway;
use notihub_core::config::AppConfig;
use notihub_core::error::AppError;
use notihub_realtime::SocketHub;
use notihub_worker::{ReleaseScheduler, WorkerPool};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("NOTIHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    let timezone = config.timezone()?;
    tracing::info!(timezone = %timezone, "Using server timezone");

    // ── Step 1: Database ─────────────────────────────────────────
    tracing::info!("Connecting to database...");
    let db_pool = notihub_database::DatabasePool::connect(&config.database).await?;

    notihub_database::migration::run_migrations(db_pool.pool()).await?;

    // ── Step 2: Broker ───────────────────────────────────────────
    tracing::info!("Connecting to message broker...");
    let broker = Arc::new(BrokerGateway::connect(&config.broker).await?);

    // ── Step 3: Socket hub ───────────────────────────────────────
    let hub = SocketHub::new();

    let config = Arc::new(config);
    let state = AppState::build(
        Arc::clone(&config),
        db_pool.into_pool(),
        Arc::clone(&broker),
        hub,
    )?;

    let (cancel_tx, cancel_rx) = watch::channel(false);

    // ── Step 4: Workers + scheduler ──────────────────────────────
    let worker_pool = WorkerPool::new(
        Arc::clone(&broker),
        Arc::clone(&state.processor),
        config.worker.clone(),
    );
    let worker_handles = worker_pool.spawn(cancel_rx.clone());

    let scheduler = Arc::new(ReleaseScheduler::new(
        Arc::clone(&state.notification_repo),
        Arc::clone(&state.dispatch_service),
        timezone,
    ));
    let scheduler_handle = tokio::spawn(Arc::clone(&scheduler).run(cancel_rx.clone()));

    // ── Step 5: Serve until interrupted ──────────────────────────
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            let _ = cancel_tx.send(true);
        }
    });

    notihub_api::run_server(state, cancel_rx).await?;

    // ── Step 6: Drain background tasks ───────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    for handle in worker_handles {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    let _ = tokio::time::timeout(grace, scheduler_handle).await;
    broker.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
