//! Group and member entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named recipient group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    /// Unique group identifier.
    pub id: Uuid,
    /// Group name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Members, when loaded alongside the group.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub members: Option<Vec<Member>>,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A member of a recipient group. At least one addressing field (CPF,
/// phone, or e-mail) must be present.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    /// Unique member identifier.
    pub id: Uuid,
    /// Owning group.
    pub group_id: Uuid,
    /// Member CPF.
    pub cpf: String,
    /// Member phone.
    pub phone: String,
    /// Member e-mail.
    pub email: String,
    /// Display name.
    pub name: String,
    /// When the member was added.
    pub created_at: DateTime<Utc>,
    /// When the member was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Whether the member carries at least one addressing field.
    pub fn is_addressable(&self) -> bool {
        !self.cpf.is_empty() || !self.phone.is_empty() || !self.email.is_empty()
    }
}
