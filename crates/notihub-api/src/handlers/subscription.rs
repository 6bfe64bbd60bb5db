//! Push subscription handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use notihub_core::error::AppError;
use notihub_entity::subscription::Subscription;

use crate::dto::request::{SubscribeRequest, UnsubscribeRequest};
use crate::dto::response::MessageResponse;
use crate::state::AppState;

/// POST /api/v1/subscriptions
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let now = Utc::now();
    let subscription = Subscription {
        id: Uuid::new_v4(),
        user_cpf: request.user_cpf,
        user_phone: request.user_phone,
        endpoint: request.endpoint,
        p256dh: request.p256dh,
        auth: request.auth,
        created_at: now,
        updated_at: now,
    };

    let stored = state.subscription_repo.upsert(&subscription).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// DELETE /api/v1/subscriptions
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    if !state
        .subscription_repo
        .delete_by_endpoint(&request.endpoint)
        .await?
    {
        return Err(AppError::not_found("Subscription not found"));
    }
    Ok(Json(MessageResponse::new("Subscription removed")))
}
