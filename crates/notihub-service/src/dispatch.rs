//! Dispatch coordinator.
//!
//! Classifies a submission (user / group / broadcast, immediate /
//! scheduled), persists the notification record, and hands immediate sends
//! to the broker gateway. The persisted row is the system-of-record; a
//! publish failure flips it to `failed` before the error is surfaced.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use notihub_broker::BrokerGateway;
use notihub_core::error::AppError;
use notihub_core::result::AppResult;
use notihub_database::repositories::{GroupRepository, NotificationRepository};
use notihub_entity::notification::{Notification, NotificationStatus};

/// One recipient of a batch submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRecipient {
    /// Recipient CPF.
    #[serde(default)]
    pub cpf: String,
    /// Recipient phone.
    #[serde(default)]
    pub phone: String,
    /// Recipient e-mail.
    #[serde(default)]
    pub email: String,
    /// Display name used in per-recipient error labels.
    #[serde(default)]
    pub name: String,
}

/// Aggregate result of a batch or group submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Number of recipients attempted.
    pub total: usize,
    /// Number of submissions accepted into the pipeline.
    pub succeeded: usize,
    /// Number of submissions rejected.
    pub failed: usize,
    /// One label-prefixed message per failed recipient.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

/// Ingress coordinator for all notification submissions.
#[derive(Debug, Clone)]
pub struct DispatchService {
    notifications: Arc<NotificationRepository>,
    groups: Arc<GroupRepository>,
    broker: Arc<BrokerGateway>,
}

impl DispatchService {
    /// Create a new dispatch service.
    pub fn new(
        notifications: Arc<NotificationRepository>,
        groups: Arc<GroupRepository>,
        broker: Arc<BrokerGateway>,
    ) -> Self {
        Self {
            notifications,
            groups,
            broker,
        }
    }

    /// Submit a directed notification. At least one of CPF, phone, or
    /// e-mail must be provided.
    pub async fn send_to_user(
        &self,
        cpf: &str,
        phone: &str,
        email: &str,
        mut notification: Notification,
    ) -> AppResult<Notification> {
        if cpf.is_empty() && phone.is_empty() && email.is_empty() {
            return Err(AppError::validation(
                "At least one of cpf, phone, or email is required",
            ));
        }
        if !cpf.is_empty() {
            notification.user_cpf = Some(cpf.to_string());
        }
        if !phone.is_empty() {
            notification.user_phone = Some(phone.to_string());
        }
        if !email.is_empty() {
            notification.user_email = Some(email.to_string());
        }

        self.send(notification).await
    }

    /// Submit a notification to every member of a group.
    ///
    /// One directed record is materialized per member with that member's
    /// identifiers; a failure for one member does not abort the others.
    pub async fn send_to_group(
        &self,
        group_id: Uuid,
        notification: Notification,
    ) -> AppResult<BatchOutcome> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Group {group_id} not found")))?;
        let members = group.members.unwrap_or_default();

        let mut outcome = BatchOutcome {
            total: members.len(),
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        };

        for (index, member) in members.iter().enumerate() {
            let mut directed = notification.clone();
            directed.id = Uuid::new_v4();
            directed.group_id = Some(group_id);

            match self
                .send_to_user(&member.cpf, &member.phone, &member.email, directed)
                .await
            {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    warn!(group_id = %group_id, member_id = %member.id, error = %e, "Group member dispatch failed");
                    outcome.failed += 1;
                    let label = if member.name.is_empty() {
                        format!("Member {}", index + 1)
                    } else {
                        member.name.clone()
                    };
                    outcome.errors.push(format!("{label}: {e}"));
                }
            }
        }

        Ok(outcome)
    }

    /// Submit a notification to the entire audience.
    pub async fn send_broadcast(&self, mut notification: Notification) -> AppResult<Notification> {
        notification.broadcast = true;
        self.send(notification).await
    }

    /// Submit a notification to an explicit list of recipients.
    pub async fn send_batch(
        &self,
        recipients: &[BatchRecipient],
        notification: &Notification,
    ) -> AppResult<BatchOutcome> {
        let mut outcome = BatchOutcome {
            total: recipients.len(),
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        };

        for (index, recipient) in recipients.iter().enumerate() {
            let mut directed = notification.clone();
            directed.id = Uuid::new_v4();

            match self
                .send_to_user(&recipient.cpf, &recipient.phone, &recipient.email, directed)
                .await
            {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    outcome.failed += 1;
                    outcome
                        .errors
                        .push(format!("{}: {e}", recipient_label(index, recipient)));
                }
            }
        }

        info!(
            total = outcome.total,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch submission completed"
        );
        Ok(outcome)
    }

    /// Persist and, unless scheduled, publish a notification.
    pub async fn send(&self, mut notification: Notification) -> AppResult<Notification> {
        validate_submission(&notification)?;

        if notification.is_scheduled {
            notification.status = NotificationStatus::Scheduled;
            let stored = self.notifications.create(&notification).await?;
            info!(
                notification_id = %stored.id,
                scheduled_for = ?stored.scheduled_for,
                "Scheduled notification created"
            );
            return Ok(stored);
        }

        notification.status = NotificationStatus::Pending;
        let stored = self.notifications.create(&notification).await?;
        self.publish(&stored).await?;
        Ok(stored)
    }

    /// Publish an already-persisted notification to the broker, flipping
    /// the record to `failed` when the broker rejects it.
    pub async fn publish(&self, notification: &Notification) -> AppResult<()> {
        if let Err(e) = self.broker.publish(notification).await {
            warn!(notification_id = %notification.id, error = %e, "Publish failed");
            self.notifications
                .update_status(notification.id, NotificationStatus::Failed)
                .await?;
            return Err(e);
        }
        Ok(())
    }

    /// Mark a notification as read.
    pub async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        if self.notifications.mark_read(id).await? {
            return Ok(());
        }
        // Nothing was updated: distinguish a missing record from an
        // already-terminal one (which is an idempotent no-op).
        match self.notifications.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("Notification {id} not found"))),
        }
    }

    /// Cancel a scheduled notification.
    ///
    /// Contends on the same conditional update as the scheduler's release;
    /// when the record has already been released (or never existed in the
    /// scheduled state) the call is a no-op that still succeeds.
    pub async fn cancel_scheduled(&self, id: Uuid) -> AppResult<bool> {
        let cancelled = self.notifications.cancel_scheduled(id).await?;
        if cancelled {
            info!(notification_id = %id, "Scheduled notification cancelled");
        }
        Ok(cancelled)
    }
}

/// Validate a submission before it is persisted.
fn validate_submission(notification: &Notification) -> AppResult<()> {
    if notification.title.is_empty() || notification.message.is_empty() {
        return Err(AppError::validation("Title and message are required"));
    }
    if notification.is_scheduled {
        let Some(scheduled_for) = notification.scheduled_for else {
            return Err(AppError::validation(
                "scheduled_for is required for scheduled notifications",
            ));
        };
        if scheduled_for <= Utc::now() {
            return Err(AppError::validation("scheduled_for must be in the future"));
        }
    }
    Ok(())
}

/// Per-recipient error label: name, else an identifier, else the 1-based
/// position in the batch.
fn recipient_label(index: usize, recipient: &BatchRecipient) -> String {
    if !recipient.name.is_empty() {
        recipient.name.clone()
    } else if !recipient.cpf.is_empty() {
        format!("CPF {}", recipient.cpf)
    } else if !recipient.phone.is_empty() {
        format!("Phone {}", recipient.phone)
    } else if !recipient.email.is_empty() {
        format!("Email {}", recipient.email)
    } else {
        format!("Recipient {}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use notihub_entity::notification::NotificationKind;

    fn submission() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            title: "T".to_string(),
            message: "M".to_string(),
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

    #[test]
    fn test_validate_requires_title_and_message() {
        let mut n = submission();
        n.title = String::new();
        assert!(validate_submission(&n).is_err());

        let mut n = submission();
        n.message = String::new();
        assert!(validate_submission(&n).is_err());

        assert!(validate_submission(&submission()).is_ok());
    }

    #[test]
    fn test_validate_scheduled_requires_future_release_time() {
        let mut n = submission();
        n.is_scheduled = true;
        assert!(validate_submission(&n).is_err(), "missing scheduled_for");

        n.scheduled_for = Some(Utc::now() - Duration::minutes(1));
        assert!(validate_submission(&n).is_err(), "past scheduled_for");

        n.scheduled_for = Some(Utc::now() + Duration::minutes(2));
        assert!(validate_submission(&n).is_ok());
    }

    #[test]
    fn test_recipient_label_prefers_name_then_identifiers() {
        let named = BatchRecipient {
            name: "Alice".to_string(),
            cpf: "111".to_string(),
            ..Default::default()
        };
        assert_eq!(recipient_label(0, &named), "Alice");

        let by_cpf = BatchRecipient {
            cpf: "111".to_string(),
            ..Default::default()
        };
        assert_eq!(recipient_label(0, &by_cpf), "CPF 111");

        let by_phone = BatchRecipient {
            phone: "5521".to_string(),
            ..Default::default()
        };
        assert_eq!(recipient_label(0, &by_phone), "Phone 5521");

        // The fallback formats the 1-based position as an integer.
        let anonymous = BatchRecipient::default();
        assert_eq!(recipient_label(2, &anonymous), "Recipient 3");
    }
}
