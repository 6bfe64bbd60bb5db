//! Broker inspection handlers.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use notihub_core::error::AppError;

use crate::state::AppState;

/// GET /api/v1/queue/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let stats = state.broker.stats().await?;
    Ok(Json(serde_json::json!({
        "queue_name": stats.queue_name,
        "messages": stats.messages,
        "consumers": stats.consumers,
        "dlq_messages": stats.dlq_messages,
        "last_checked": Utc::now(),
    })))
}

/// POST /api/v1/queue/purge
pub async fn purge(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let purged = state.broker.purge().await?;
    Ok(Json(serde_json::json!({
        "message": "Queue purged successfully",
        "purged": purged,
    })))
}
