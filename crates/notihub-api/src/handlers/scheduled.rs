//! Scheduled notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use notihub_core::error::AppError;
use notihub_entity::notification::Notification;

use crate::dto::response::MessageResponse;
use crate::extractors::ListParams;
use crate::state::AppState;

/// GET /api/v1/scheduled-notifications
pub async fn list_scheduled(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notification_repo
        .find_scheduled(params.window())
        .await?;
    Ok(Json(notifications))
}

/// POST /api/v1/scheduled-notifications/{id}/cancel
///
/// Cancelling a notification that has already been released is a no-op
/// that still reports success.
pub async fn cancel_scheduled(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.dispatch_service.cancel_scheduled(id).await?;
    Ok(Json(MessageResponse::new("Scheduled notification cancelled")))
}
