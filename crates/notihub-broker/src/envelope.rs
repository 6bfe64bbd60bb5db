//! Queue envelope wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notihub_entity::notification::Notification;

/// The only form in which a notification crosses the broker.
///
/// The embedded notification is an ephemeral hint; on any conflict with the
/// database record, the database wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEnvelope {
    /// The notification snapshot at enqueue time.
    pub notification: Notification,
    /// When the envelope was enqueued.
    #[serde(rename = "timestamp")]
    pub enqueued_at: DateTime<Utc>,
    /// Number of processing attempts already consumed by this notification.
    pub retry_count: u32,
}

impl QueueEnvelope {
    /// Wrap a notification in a fresh envelope.
    pub fn new(notification: Notification) -> Self {
        Self {
            notification,
            enqueued_at: Utc::now(),
            retry_count: 0,
        }
    }

    /// Build the follow-up envelope published after a failed attempt.
    pub fn next_retry(&self) -> Self {
        Self {
            notification: self.notification.clone(),
            enqueued_at: Utc::now(),
            retry_count: self.retry_count + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notihub_entity::notification::{NotificationKind, NotificationStatus};
    use uuid::Uuid;

    fn sample_notification() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            title: "Title".to_string(),
            message: "Body".to_string(),
            kind: NotificationKind::Push,
            status: NotificationStatus::Pending,
            data: Some(serde_json::json!({"deep": {"link": "/home"}})),
            user_cpf: Some("12345678901".to_string()),
            user_phone: None,
            user_email: None,
            group_id: None,
            broadcast: false,
            is_html: false,
            is_scheduled: false,
            scheduled_for: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_envelope_wire_field_names() {
        let envelope = QueueEnvelope::new(sample_notification());
        let value = serde_json::to_value(&envelope).unwrap();

        assert!(value.get("notification").is_some());
        assert!(value.get("timestamp").is_some());
        assert_eq!(value.get("retry_count").unwrap(), 0);
        assert_eq!(
            value["notification"]["type"],
            serde_json::Value::String("push".to_string())
        );
    }

    #[test]
    fn test_envelope_round_trip_preserves_notification() {
        let envelope = QueueEnvelope::new(sample_notification());
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: QueueEnvelope = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded.notification.id, envelope.notification.id);
        assert_eq!(decoded.notification.data, envelope.notification.data);
        assert_eq!(decoded.retry_count, 0);
    }

    #[test]
    fn test_next_retry_increments_count() {
        let envelope = QueueEnvelope::new(sample_notification());
        let retried = envelope.next_retry().next_retry();
        assert_eq!(retried.retry_count, 2);
        assert_eq!(retried.notification.id, envelope.notification.id);
    }
}
