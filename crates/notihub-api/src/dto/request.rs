//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use notihub_entity::notification::{Notification, NotificationKind, NotificationStatus};
use notihub_service::BatchRecipient;

/// Body shared by the send endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendNotificationRequest {
    /// Notification title.
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    /// Notification body.
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    /// Delivery channels.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Arbitrary structured payload.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Recipient CPF (send-to-user only).
    #[serde(default)]
    pub cpf: String,
    /// Recipient phone (send-to-user only).
    #[serde(default)]
    pub phone: String,
    /// Recipient e-mail (send-to-user only).
    #[serde(default)]
    pub email: String,
    /// Whether the body is HTML.
    #[serde(default)]
    pub is_html: bool,
    /// Whether the notification is held for future release.
    #[serde(default)]
    pub is_scheduled: bool,
    /// RFC-3339 release instant; must lie strictly in the future.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl SendNotificationRequest {
    /// Materialize a notification record from this request.
    pub fn into_notification(self) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            title: self.title,
            message: self.message,
            kind: self.kind,
            status: NotificationStatus::Pending,
            data: self.data,
            user_cpf: None,
            user_phone: None,
            user_email: None,
            group_id: None,
            broadcast: false,
            is_html: self.is_html,
            is_scheduled: self.is_scheduled,
            scheduled_for: self.scheduled_for,
            created_at: now,
            updated_at: now,
            read_at: None,
        }
    }
}

/// Body of the batch send endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendBatchRequest {
    /// Notification fields shared by every recipient.
    #[serde(flatten)]
    #[validate(nested)]
    pub notification: SendNotificationRequest,
    /// Recipient list.
    #[validate(length(min = 1, message = "At least one recipient is required"))]
    pub recipients: Vec<BatchRecipient>,
}

/// Body of the push subscription registration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubscribeRequest {
    /// Owning user's CPF.
    #[serde(default)]
    pub user_cpf: String,
    /// Owning user's phone.
    #[serde(default)]
    pub user_phone: String,
    /// Push service endpoint URL.
    #[validate(length(min = 1, message = "Endpoint is required"))]
    pub endpoint: String,
    /// P-256 ECDH public key.
    #[validate(length(min = 1, message = "p256dh is required"))]
    pub p256dh: String,
    /// Authentication secret.
    #[validate(length(min = 1, message = "auth is required"))]
    pub auth: String,
}

/// Body of the push subscription removal endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UnsubscribeRequest {
    /// Endpoint of the subscription to remove.
    #[validate(length(min = 1, message = "Endpoint is required"))]
    pub endpoint: String,
}

/// Body of the group create/update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GroupRequest {
    /// Group name.
    #[validate(length(min = 1, message = "Group name is required"))]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Body of the member create/update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRequest {
    /// Member CPF.
    #[serde(default)]
    pub cpf: String,
    /// Member phone.
    #[serde(default)]
    pub phone: String,
    /// Member e-mail.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_parses_rfc3339_schedule() {
        let body = serde_json::json!({
            "title": "T",
            "message": "M",
            "type": "push",
            "is_scheduled": true,
            "scheduled_for": "2030-06-01T12:00:00-03:00"
        });
        let request: SendNotificationRequest = serde_json::from_value(body).unwrap();
        assert!(request.is_scheduled);
        assert_eq!(request.kind, NotificationKind::Push);
        let scheduled_for = request.scheduled_for.unwrap();
        assert_eq!(scheduled_for.to_rfc3339(), "2030-06-01T15:00:00+00:00");
    }

    #[test]
    fn test_send_request_rejects_unknown_kind() {
        let body = serde_json::json!({
            "title": "T",
            "message": "M",
            "type": "carrier-pigeon"
        });
        assert!(serde_json::from_value::<SendNotificationRequest>(body).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_title() {
        let request = SendNotificationRequest {
            title: String::new(),
            message: "M".to_string(),
            kind: NotificationKind::InApp,
            data: None,
            cpf: String::new(),
            phone: String::new(),
            email: String::new(),
            is_html: false,
            is_scheduled: false,
            scheduled_for: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_batch_request_flattens_notification_fields() {
        let body = serde_json::json!({
            "title": "T",
            "message": "M",
            "type": "all",
            "recipients": [
                {"cpf": "111"},
                {"email": "x@y", "name": "X"}
            ]
        });
        let request: SendBatchRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.recipients.len(), 2);
        assert_eq!(request.notification.kind, NotificationKind::All);
    }
}
