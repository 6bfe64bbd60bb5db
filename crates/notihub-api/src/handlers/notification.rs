//! Notification handlers: CRUD, identifier lookups, and the send
//! endpoints feeding the dispatch pipeline.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use notihub_core::error::AppError;
use notihub_core::types::pagination::PageInfo;
use notihub_entity::notification::Notification;
use notihub_service::BatchOutcome;

use crate::dto::request::{SendBatchRequest, SendNotificationRequest};
use crate::dto::response::MessageResponse;
use crate::extractors::{AuthUser, ListParams};
use crate::state::AppState;

/// GET /api/v1/notifications
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.notification_repo.find_all(params.window()).await?;
    Ok(Json(notifications))
}

/// GET /api/v1/notifications/me
pub async fn my_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let window = params.window();
    let notifications = state
        .notification_repo
        .find_by_cpf(&auth.cpf, window)
        .await?;
    let pagination = PageInfo::from_window(&window, notifications.len());

    Ok(Json(serde_json::json!({
        "user": {
            "cpf": auth.cpf.clone(),
            "email": auth.email.clone(),
            "name": auth.name.clone(),
            "email_verified": auth.email_verified,
        },
        "notifications": notifications,
        "pagination": pagination,
    })))
}

/// POST /api/v1/notifications
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let notification = request.into_notification();
    let stored = state.notification_repo.create(&notification).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/notifications/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification = state
        .notification_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;
    Ok(Json(notification))
}

/// PUT /api/v1/notifications/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<Notification>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let existing = state
        .notification_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;

    let mut notification = request.into_notification();
    notification.id = existing.id;
    notification.status = existing.status;
    let stored = state.notification_repo.update(&notification).await?;
    Ok(Json(stored))
}

/// DELETE /api/v1/notifications/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.notification_repo.delete(id).await? {
        return Err(AppError::not_found(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.dispatch_service.mark_read(id).await?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}

/// GET /api/v1/notifications/cpf/{cpf}
pub async fn by_cpf(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notification_repo
        .find_by_cpf(&cpf, params.window())
        .await?;
    Ok(Json(notifications))
}

/// GET /api/v1/notifications/phone/{phone}
pub async fn by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notification_repo
        .find_by_phone(&phone, params.window())
        .await?;
    Ok(Json(notifications))
}

/// GET /api/v1/notifications/email/{email}
pub async fn by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notification_repo
        .find_by_email(&email, params.window())
        .await?;
    Ok(Json(notifications))
}

/// GET /api/v1/notifications/group/{group_id}
pub async fn by_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notification_repo
        .find_by_group(group_id, params.window())
        .await?;
    Ok(Json(notifications))
}

/// POST /api/v1/notifications/send/user
pub async fn send_to_user(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<Notification>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let cpf = request.cpf.clone();
    let phone = request.phone.clone();
    let email = request.email.clone();
    let notification = request.into_notification();

    let stored = state
        .dispatch_service
        .send_to_user(&cpf, &phone, &email, notification)
        .await?;
    Ok(Json(stored))
}

/// POST /api/v1/notifications/send/group/{group_id}
pub async fn send_to_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let outcome = state
        .dispatch_service
        .send_to_group(group_id, request.into_notification())
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/notifications/send/broadcast
pub async fn send_broadcast(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<Notification>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let stored = state
        .dispatch_service
        .send_broadcast(request.into_notification())
        .await?;
    Ok(Json(stored))
}

/// POST /api/v1/notifications/send/batch
pub async fn send_batch(
    State(state): State<AppState>,
    Json(request): Json<SendBatchRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let recipients = request.recipients;
    let notification = request.notification.into_notification();

    let outcome = state
        .dispatch_service
        .send_batch(&recipients, &notification)
        .await?;
    Ok(Json(outcome))
}
