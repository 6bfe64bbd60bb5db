//! Group and member management.

use std::sync::Arc;

use uuid::Uuid;

use notihub_core::error::AppError;
use notihub_core::result::AppResult;
use notihub_core::types::pagination::ListWindow;
use notihub_database::repositories::GroupRepository;
use notihub_entity::group::{Group, Member};

/// Manages recipient groups and their members.
#[derive(Debug, Clone)]
pub struct GroupService {
    groups: Arc<GroupRepository>,
}

impl GroupService {
    /// Create a new group service.
    pub fn new(groups: Arc<GroupRepository>) -> Self {
        Self { groups }
    }

    /// Create a group.
    pub async fn create_group(&self, group: Group) -> AppResult<Group> {
        if group.name.is_empty() {
            return Err(AppError::validation("Group name is required"));
        }
        self.groups.create(&group).await
    }

    /// Fetch a group with its members.
    pub async fn get_group(&self, id: Uuid) -> AppResult<Group> {
        self.groups
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Group {id} not found")))
    }

    /// List groups.
    pub async fn list_groups(&self, window: ListWindow) -> AppResult<Vec<Group>> {
        self.groups.find_all(window).await
    }

    /// Update a group's name and description.
    pub async fn update_group(&self, group: Group) -> AppResult<Group> {
        if group.name.is_empty() {
            return Err(AppError::validation("Group name is required"));
        }
        self.groups.update(&group).await
    }

    /// Delete a group and (by cascade) its members.
    pub async fn delete_group(&self, id: Uuid) -> AppResult<()> {
        if !self.groups.delete(id).await? {
            return Err(AppError::not_found(format!("Group {id} not found")));
        }
        Ok(())
    }

    /// Add a member to a group. A member must be reachable by CPF or phone.
    pub async fn add_member(&self, member: Member) -> AppResult<Member> {
        if member.cpf.is_empty() && member.phone.is_empty() {
            return Err(AppError::validation("Either cpf or phone is required"));
        }
        self.groups.add_member(&member).await
    }

    /// List the members of a group.
    pub async fn get_members(&self, group_id: Uuid) -> AppResult<Vec<Member>> {
        self.groups.find_members(group_id).await
    }

    /// Fetch a member.
    pub async fn get_member(&self, id: Uuid) -> AppResult<Member> {
        self.groups
            .find_member_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Member {id} not found")))
    }

    /// Update a member's addressing fields.
    pub async fn update_member(&self, member: Member) -> AppResult<Member> {
        if !member.is_addressable() {
            return Err(AppError::validation(
                "At least one of cpf, phone, or email is required",
            ));
        }
        self.groups.update_member(&member).await
    }

    /// Remove a member from its group.
    pub async fn remove_member(&self, id: Uuid) -> AppResult<()> {
        if !self.groups.remove_member(id).await? {
            return Err(AppError::not_found(format!("Member {id} not found")));
        }
        Ok(())
    }
}
