//! Server bootstrap: binds the listener and serves the router until the
//! shutdown signal fires.

use tokio::sync::watch;
use tracing::info;

use notihub_core::error::AppError;

use crate::router::build_router;
use crate::state::AppState;

/// Serve the HTTP API until the cancel signal flips to `true`.
pub async fn run_server(state: AppState, mut cancel: watch::Receiver<bool>) -> Result<(), AppError> {
    let addr = state.config.server.bind_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while cancel.changed().await.is_ok() {
                if *cancel.borrow() {
                    break;
                }
            }
            info!("Shutdown signal received, draining connections");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
