//! Group and member handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use notihub_core::error::AppError;
use notihub_entity::group::{Group, Member};

use crate::dto::request::{GroupRequest, MemberRequest};
use crate::dto::response::MessageResponse;
use crate::extractors::ListParams;
use crate::state::AppState;

/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<GroupRequest>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let now = Utc::now();
    let group = Group {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        members: None,
        created_at: now,
        updated_at: now,
    };

    let stored = state.group_service.create_group(group).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Group>>, AppError> {
    let groups = state.group_service.list_groups(params.window()).await?;
    Ok(Json(groups))
}

/// GET /api/v1/groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Group>, AppError> {
    let group = state.group_service.get_group(id).await?;
    Ok(Json(group))
}

/// PUT /api/v1/groups/{id}
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GroupRequest>,
) -> Result<Json<Group>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut group = state.group_service.get_group(id).await?;
    group.name = request.name;
    group.description = request.description;
    group.members = None;

    let stored = state.group_service.update_group(group).await?;
    Ok(Json(stored))
}

/// DELETE /api/v1/groups/{id}
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.group_service.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/groups/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    // The owning group must exist before a member is attached.
    state.group_service.get_group(id).await?;

    let now = Utc::now();
    let member = Member {
        id: Uuid::new_v4(),
        group_id: id,
        cpf: request.cpf,
        phone: request.phone,
        email: request.email,
        name: request.name,
        created_at: now,
        updated_at: now,
    };

    let stored = state.group_service.add_member(member).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/groups/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Member>>, AppError> {
    let members = state.group_service.get_members(id).await?;
    Ok(Json(members))
}

/// GET /api/v1/groups/{id}/members/{member_id}
pub async fn get_member(
    State(state): State<AppState>,
    Path((_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Member>, AppError> {
    let member = state.group_service.get_member(member_id).await?;
    Ok(Json(member))
}

/// PUT /api/v1/groups/{id}/members/{member_id}
pub async fn update_member(
    State(state): State<AppState>,
    Path((_id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<MemberRequest>,
) -> Result<Json<Member>, AppError> {
    let mut member = state.group_service.get_member(member_id).await?;
    member.cpf = request.cpf;
    member.phone = request.phone;
    member.email = request.email;
    member.name = request.name;

    let stored = state.group_service.update_member(member).await?;
    Ok(Json(stored))
}

/// DELETE /api/v1/groups/{id}/members/{member_id}
pub async fn remove_member(
    State(state): State<AppState>,
    Path((_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    state.group_service.remove_member(member_id).await?;
    Ok(Json(MessageResponse::new("Member removed")))
}
