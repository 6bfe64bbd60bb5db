//! Web Push subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A browser/device push subscription registered by a client.
///
/// Created on client registration; deleted on unregister or when the push
/// service reports the endpoint permanently gone (404/410).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: Uuid,
    /// Owning user's CPF.
    pub user_cpf: String,
    /// Owning user's phone.
    pub user_phone: String,
    /// Push service endpoint URL; unique across the store.
    pub endpoint: String,
    /// P-256 ECDH public key (base64url).
    pub p256dh: String,
    /// Authentication secret (base64url).
    pub auth: String,
    /// When the subscription was registered.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}
