//! Per-envelope fan-out processor.
//!
//! Runs inside the worker pool. For each envelope: re-read the persisted
//! record (the envelope is only a hint; the database wins), compute the
//! applicable channel legs from the notification kind, execute them in
//! order (in-app, push, e-mail), and write the terminal status back.
//!
//! Returning an error hands the envelope back to the broker gateway for
//! retry, so this handler is idempotent over the record's status
//! transitions.

use std::sync::Arc;

use tracing::{debug, info, warn};

use notihub_broker::QueueEnvelope;
use notihub_channels::{EmailRelayClient, EmailRequest, WebPushSender};
use notihub_core::result::AppResult;
use notihub_database::repositories::NotificationRepository;
use notihub_entity::notification::{Notification, NotificationKind, NotificationStatus};
use notihub_realtime::SocketHub;

/// Applies the fan-out policy to one queued notification.
#[derive(Debug)]
pub struct NotificationProcessor {
    notifications: Arc<NotificationRepository>,
    hub: SocketHub,
    webpush: Arc<WebPushSender>,
    email: Arc<EmailRelayClient>,
}

impl NotificationProcessor {
    /// Create a new processor.
    pub fn new(
        notifications: Arc<NotificationRepository>,
        hub: SocketHub,
        webpush: Arc<WebPushSender>,
        email: Arc<EmailRelayClient>,
    ) -> Self {
        Self {
            notifications,
            hub,
            webpush,
            email,
        }
    }

    /// Process one envelope end to end.
    pub async fn process(&self, envelope: QueueEnvelope) -> AppResult<()> {
        // Prefer the authoritative record over the envelope snapshot.
        let notification = match self.notifications.find_by_id(envelope.notification.id).await? {
            Some(record) => record,
            None => envelope.notification,
        };

        if notification.status == NotificationStatus::Cancelled {
            debug!(notification_id = %notification.id, "Record cancelled, skipping");
            return Ok(());
        }

        let email_address = notification
            .user_email
            .as_deref()
            .filter(|v| !v.is_empty());

        let send_in_app = notification.kind.wants_in_app();
        let send_push = notification.kind.wants_push();
        let send_email = notification.kind.wants_email() && email_address.is_some();

        debug!(
            notification_id = %notification.id,
            in_app = send_in_app,
            push = send_push,
            email = send_email,
            retry = envelope.retry_count,
            "Applying fan-out policy"
        );

        if send_in_app {
            self.hub.deliver(notification.clone());
        }

        if send_push {
            if let Err(e) = self.webpush.send(&notification).await {
                warn!(notification_id = %notification.id, error = %e, "Push leg failed");
                self.notifications
                    .update_status(notification.id, NotificationStatus::Failed)
                    .await?;
                return Err(e);
            }
        }

        if send_email {
            let request = email_request(&notification);
            if let Err(e) = self.email.send(&request).await {
                warn!(notification_id = %notification.id, error = %e, "Email leg failed");
                self.notifications
                    .update_status(notification.id, NotificationStatus::Failed)
                    .await?;
                return Err(e);
            }
        } else if notification.kind == NotificationKind::Email {
            // An email-only notification without an address is a degraded
            // send: recorded failed, but retrying cannot help, so the
            // envelope is still acknowledged.
            warn!(notification_id = %notification.id, "Email kind without an address");
            self.notifications
                .update_status(notification.id, NotificationStatus::Failed)
                .await?;
            return Ok(());
        }

        self.notifications
            .update_status(notification.id, NotificationStatus::Sent)
            .await?;
        info!(notification_id = %notification.id, "Notification processed");
        Ok(())
    }
}

/// Build the relay envelope for a notification's e-mail leg.
fn email_request(notification: &Notification) -> EmailRequest {
    EmailRequest {
        to_addresses: notification
            .user_email
            .iter()
            .map(|email| email.to_string())
            .collect(),
        subject: notification.title.clone(),
        body: notification.message.clone(),
        is_html_body: notification.is_html,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_email_request_carries_subject_body_and_html_flag() {
        let n = Notification {
            id: Uuid::new_v4(),
            title: "Subject line".to_string(),
            message: "<p>Hello</p>".to_string(),
            kind: NotificationKind::Email,
            status: NotificationStatus::Pending,
            data: None,
            user_cpf: None,
            user_phone: None,
            user_email: Some("x@y".to_string()),
            group_id: None,
            broadcast: false,
            is_html: true,
            is_scheduled: false,
            scheduled_for: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            read_at: None,
        };

        let request = email_request(&n);
        assert_eq!(request.to_addresses, vec!["x@y".to_string()]);
        assert_eq!(request.subject, "Subject line");
        assert_eq!(request.body, "<p>Hello</p>");
        assert!(request.is_html_body);
    }
}
