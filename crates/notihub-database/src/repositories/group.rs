//! Group and member repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use notihub_core::error::{AppError, ErrorKind};
use notihub_core::result::AppResult;
use notihub_core::types::pagination::ListWindow;
use notihub_entity::group::{Group, Member};

/// Repository for recipient groups and their members.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new group repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new group.
    pub async fn create(&self, g: &Group) -> AppResult<Group> {
        sqlx::query_as::<_, Group>(
            "INSERT INTO groups (id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING *",
        )
        .bind(g.id)
        .bind(&g.name)
        .bind(&g.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create group", e))
    }

    /// Fetch a group by id, with its members loaded.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch group", e))?;

        match group {
            Some(mut g) => {
                g.members = Some(self.find_members(id).await?);
                Ok(Some(g))
            }
            None => Ok(None),
        }
    }

    /// List groups, newest first.
    pub async fn find_all(&self, window: ListWindow) -> AppResult<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            "SELECT * FROM groups ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list groups", e))
    }

    /// Update a group's name and description.
    pub async fn update(&self, g: &Group) -> AppResult<Group> {
        sqlx::query_as::<_, Group>(
            "UPDATE groups SET name = $2, description = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(g.id)
        .bind(&g.name)
        .bind(&g.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update group", e))
    }

    /// Delete a group; members are removed by the cascade constraint.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete group", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a member to a group.
    pub async fn add_member(&self, m: &Member) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (id, group_id, cpf, phone, email, name, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING *",
        )
        .bind(m.id)
        .bind(m.group_id)
        .bind(&m.cpf)
        .bind(&m.phone)
        .bind(&m.email)
        .bind(&m.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to add member", e))
    }

    /// List the members of a group.
    pub async fn find_members(&self, group_id: Uuid) -> AppResult<Vec<Member>> {
        sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE group_id = $1 ORDER BY created_at ASC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list members", e))
    }

    /// Fetch a member by id.
    pub async fn find_member_by_id(&self, id: Uuid) -> AppResult<Option<Member>> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch member", e))
    }

    /// Update a member's addressing fields.
    pub async fn update_member(&self, m: &Member) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            "UPDATE members SET cpf = $2, phone = $3, email = $4, name = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(m.id)
        .bind(&m.cpf)
        .bind(&m.phone)
        .bind(&m.email)
        .bind(&m.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update member", e))
    }

    /// Remove a member from its group.
    pub async fn remove_member(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove member", e))?;
        Ok(result.rows_affected() > 0)
    }
}
