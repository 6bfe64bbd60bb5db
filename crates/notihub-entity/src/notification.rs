//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Delivery channels requested for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// Real-time delivery to connected sockets only.
    InApp,
    /// Web Push to registered device subscriptions only.
    Push,
    /// E-mail only.
    Email,
    /// In-app and push. Does not include e-mail.
    Both,
    /// In-app, push, and e-mail.
    All,
}

impl NotificationKind {
    /// Whether this kind includes the in-app channel.
    pub fn wants_in_app(self) -> bool {
        matches!(self, Self::InApp | Self::Both | Self::All)
    }

    /// Whether this kind includes the Web Push channel.
    pub fn wants_push(self) -> bool {
        matches!(self, Self::Push | Self::Both | Self::All)
    }

    /// Whether this kind includes the e-mail channel.
    pub fn wants_email(self) -> bool {
        matches!(self, Self::Email | Self::All)
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InApp => write!(f, "in-app"),
            Self::Push => write!(f, "push"),
            Self::Email => write!(f, "email"),
            Self::Both => write!(f, "both"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Lifecycle state of a notification record.
///
/// Transitions form a DAG: `scheduled` and `pending` are the only sources;
/// `sent`/`delivered`/`read`, `failed`, and `cancelled` are sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Held for future release by the scheduler.
    Scheduled,
    /// In the live pipeline awaiting worker processing.
    Pending,
    /// All applicable channels accepted the notification.
    Sent,
    /// A downstream channel confirmed delivery.
    Delivered,
    /// The recipient marked the notification as read.
    Read,
    /// A channel failed and retries were (or will be) exhausted.
    Failed,
    /// A scheduled notification was cancelled before release.
    Cancelled,
}

impl NotificationStatus {
    /// Whether no further transition is allowed out of this state.
    ///
    /// `sent` and `delivered` still accept the read transition; `read`,
    /// `failed`, and `cancelled` accept nothing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Read | Self::Failed | Self::Cancelled)
    }

    /// Whether the status DAG allows `self -> next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Scheduled => matches!(next, Self::Pending | Self::Cancelled | Self::Failed),
            Self::Pending => matches!(next, Self::Sent | Self::Failed),
            Self::Sent => matches!(next, Self::Delivered | Self::Read),
            Self::Delivered => matches!(next, Self::Read),
            Self::Read | Self::Failed | Self::Cancelled => false,
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Pending => write!(f, "pending"),
            Self::Sent => write!(f, "sent"),
            Self::Delivered => write!(f, "delivered"),
            Self::Read => write!(f, "read"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A notification record. The database row is the system-of-record for the
/// notification's lifecycle; broker envelopes only carry transient copies.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Requested delivery channels.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: NotificationKind,
    /// Lifecycle status.
    pub status: NotificationStatus,
    /// Additional structured payload (arbitrary JSON).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Recipient CPF, when directed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_cpf: Option<String>,
    /// Recipient phone, when directed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_phone: Option<String>,
    /// Recipient e-mail, when directed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Owning group, when materialized from a group send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    /// Whether this notification targets every user.
    pub broadcast: bool,
    /// Whether the message body is HTML (e-mail channel).
    pub is_html: bool,
    /// Whether this notification is held for future release.
    pub is_scheduled: bool,
    /// Release instant for scheduled notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the recipient read the notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Resolve the hub routing key for a directed notification: the first
    /// non-empty of CPF and phone.
    pub fn target_user_id(&self) -> Option<&str> {
        self.user_cpf
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| self.user_phone.as_deref().filter(|v| !v.is_empty()))
    }

    /// Whether any user identifier is set.
    pub fn has_recipient(&self) -> bool {
        self.target_user_id().is_some()
            || self
                .user_email
                .as_deref()
                .is_some_and(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_channel_flags() {
        assert!(NotificationKind::InApp.wants_in_app());
        assert!(!NotificationKind::InApp.wants_push());
        assert!(!NotificationKind::InApp.wants_email());

        assert!(NotificationKind::Both.wants_in_app());
        assert!(NotificationKind::Both.wants_push());
        // "both" deliberately excludes e-mail.
        assert!(!NotificationKind::Both.wants_email());

        assert!(NotificationKind::All.wants_in_app());
        assert!(NotificationKind::All.wants_push());
        assert!(NotificationKind::All.wants_email());
    }

    #[test]
    fn test_status_sinks_have_no_outgoing_edges() {
        let all = [
            NotificationStatus::Scheduled,
            NotificationStatus::Pending,
            NotificationStatus::Sent,
            NotificationStatus::Delivered,
            NotificationStatus::Read,
            NotificationStatus::Failed,
            NotificationStatus::Cancelled,
        ];
        for sink in [
            NotificationStatus::Read,
            NotificationStatus::Failed,
            NotificationStatus::Cancelled,
        ] {
            for next in all {
                assert!(!sink.can_transition_to(next), "{sink} -> {next} must be rejected");
            }
        }
    }

    #[test]
    fn test_status_transitions() {
        assert!(NotificationStatus::Scheduled.can_transition_to(NotificationStatus::Pending));
        assert!(NotificationStatus::Scheduled.can_transition_to(NotificationStatus::Cancelled));
        assert!(NotificationStatus::Pending.can_transition_to(NotificationStatus::Sent));
        assert!(NotificationStatus::Pending.can_transition_to(NotificationStatus::Failed));
        assert!(NotificationStatus::Sent.can_transition_to(NotificationStatus::Read));
        assert!(!NotificationStatus::Sent.can_transition_to(NotificationStatus::Pending));
        assert!(!NotificationStatus::Pending.can_transition_to(NotificationStatus::Scheduled));
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::InApp).unwrap(),
            "\"in-app\""
        );
        assert_eq!(
            serde_json::from_str::<NotificationKind>("\"both\"").unwrap(),
            NotificationKind::Both
        );
    }

    #[test]
    fn test_target_user_id_prefers_cpf() {
        let mut n = sample();
        n.user_cpf = Some("12345678901".to_string());
        n.user_phone = Some("5521999999999".to_string());
        assert_eq!(n.target_user_id(), Some("12345678901"));

        n.user_cpf = Some(String::new());
        assert_eq!(n.target_user_id(), Some("5521999999999"));
    }

    fn sample() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            message: "m".to_string(),
            kind: NotificationKind::InApp,
            status: NotificationStatus::Pending,
            data: None,
            user_cpf: None,
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
}
