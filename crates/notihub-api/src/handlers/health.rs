//! Health probe handlers.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /health — basic uptime check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        checks: None,
        timestamp: Utc::now(),
    })
}

/// GET /health/live — liveness probe (process is running).
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        checks: None,
        timestamp: Utc::now(),
    })
}

/// GET /health/ready — readiness probe (dependencies reachable).
///
/// Ready means the database answers a ping and the broker answers a stats
/// query; anything else is 503 with per-check detail.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = BTreeMap::new();
    let mut healthy = true;

    let db_ping = tokio::time::timeout(
        Duration::from_secs(2),
        notihub_database::connection::ping(&state.db_pool),
    )
    .await;
    match db_ping {
        Ok(Ok(())) => {
            checks.insert("database".to_string(), "healthy".to_string());
        }
        Ok(Err(e)) => {
            checks.insert("database".to_string(), format!("unreachable: {e}"));
            healthy = false;
        }
        Err(_) => {
            checks.insert("database".to_string(), "unreachable: timeout".to_string());
            healthy = false;
        }
    }

    match state.broker.stats().await {
        Ok(_) => {
            checks.insert("broker".to_string(), "healthy".to_string());
        }
        Err(e) => {
            checks.insert("broker".to_string(), format!("unhealthy: {e}"));
            healthy = false;
        }
    }

    let (status_code, status) = if healthy {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            checks: Some(checks),
            timestamp: Utc::now(),
        }),
    )
}
