//! Web Push channel adapter.
//!
//! Resolves the recipient's device subscriptions (by CPF, else phone) and
//! POSTs an encrypted payload to each endpoint under VAPID authentication.
//! A 404/410 from the push service means the endpoint is permanently gone;
//! that subscription is deleted and its siblings continue.

use std::sync::Arc;

use tracing::{debug, info, warn};
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

use notihub_core::config::WebPushConfig;
use notihub_core::error::AppError;
use notihub_core::result::AppResult;
use notihub_database::repositories::SubscriptionRepository;
use notihub_entity::notification::Notification;
use notihub_entity::subscription::Subscription;

/// Push message TTL in seconds (24 hours).
const PUSH_TTL_SECONDS: u32 = 86_400;

/// Sends Web Push notifications to registered device subscriptions.
pub struct WebPushSender {
    client: IsahcWebPushClient,
    config: WebPushConfig,
    subscriptions: Arc<SubscriptionRepository>,
}

impl std::fmt::Debug for WebPushSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebPushSender").finish()
    }
}

impl WebPushSender {
    /// Create a new Web Push sender.
    pub fn new(
        config: WebPushConfig,
        subscriptions: Arc<SubscriptionRepository>,
    ) -> AppResult<Self> {
        let client = IsahcWebPushClient::new().map_err(|e| {
            AppError::external_service(format!("Failed to create push client: {e}"))
        })?;
        Ok(Self {
            client,
            config,
            subscriptions,
        })
    }

    /// Send a notification to every subscription of its recipient.
    ///
    /// Succeeds when at least one endpoint accepted the payload or there
    /// were no live subscriptions to try; fails only when every remaining
    /// endpoint rejected it.
    pub async fn send(&self, notification: &Notification) -> AppResult<()> {
        let subscriptions = self.resolve_subscriptions(notification).await?;
        if subscriptions.is_empty() {
            debug!(notification_id = %notification.id, "No push subscriptions, skipping");
            return Ok(());
        }

        let payload = serde_json::to_vec(&push_payload(notification))?;

        let mut delivered = 0usize;
        let mut live = subscriptions.len();
        for subscription in &subscriptions {
            match self.send_to_subscription(subscription, &payload).await {
                Ok(()) => {
                    delivered += 1;
                    debug!(
                        notification_id = %notification.id,
                        endpoint = %subscription.endpoint,
                        "Push accepted"
                    );
                }
                Err(WebPushError::EndpointNotFound) | Err(WebPushError::EndpointNotValid) => {
                    info!(
                        endpoint = %subscription.endpoint,
                        "Push endpoint permanently gone, deleting subscription"
                    );
                    live -= 1;
                    if let Err(e) = self
                        .subscriptions
                        .delete_by_endpoint(&subscription.endpoint)
                        .await
                    {
                        warn!(endpoint = %subscription.endpoint, error = %e, "Failed to delete subscription");
                    }
                }
                Err(e) => {
                    warn!(
                        notification_id = %notification.id,
                        endpoint = %subscription.endpoint,
                        error = %e,
                        "Push send failed"
                    );
                }
            }
        }

        if delivered > 0 || live == 0 {
            Ok(())
        } else {
            Err(AppError::external_service(format!(
                "Push rejected by all {live} live subscription(s)"
            )))
        }
    }

    /// Look up subscriptions by the recipient's CPF, else phone. A directed
    /// notification without either identifier sends no push; that is not an
    /// error.
    async fn resolve_subscriptions(
        &self,
        notification: &Notification,
    ) -> AppResult<Vec<Subscription>> {
        if let Some(cpf) = notification.user_cpf.as_deref().filter(|v| !v.is_empty()) {
            return self.subscriptions.find_by_cpf(cpf).await;
        }
        if let Some(phone) = notification.user_phone.as_deref().filter(|v| !v.is_empty()) {
            return self.subscriptions.find_by_phone(phone).await;
        }
        Ok(Vec::new())
    }

    async fn send_to_subscription(
        &self,
        subscription: &Subscription,
        payload: &[u8],
    ) -> Result<(), WebPushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );

        let mut sig_builder = VapidSignatureBuilder::from_base64(
            &self.config.vapid_private_key,
            web_push::URL_SAFE_NO_PAD,
            &info,
        )?;
        sig_builder.add_claim("sub", self.config.vapid_subject.clone());
        let signature = sig_builder.build()?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(PUSH_TTL_SECONDS);

        self.client.send(builder.build()?).await
    }
}

/// Build the push payload `{title, message, id, data}`.
fn push_payload(notification: &Notification) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "title": notification.title,
        "message": notification.message,
        "id": notification.id.to_string(),
    });
    if let Some(data) = &notification.data {
        payload["data"] = data.clone();
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use notihub_entity::notification::{NotificationKind, NotificationStatus};
    use uuid::Uuid;

    #[test]
    fn test_push_payload_shape() {
        let n = Notification {
            id: Uuid::new_v4(),
            title: "Alert".to_string(),
            message: "Something happened".to_string(),
            kind: NotificationKind::Push,
            status: NotificationStatus::Pending,
            data: Some(serde_json::json!({"url": "/detail/1"})),
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
        };

        let payload = push_payload(&n);
        assert_eq!(payload["title"], "Alert");
        assert_eq!(payload["message"], "Something happened");
        assert_eq!(payload["id"], n.id.to_string());
        assert_eq!(payload["data"]["url"], "/detail/1");
    }

    #[test]
    fn test_push_payload_omits_absent_data() {
        let n = Notification {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            message: "m".to_string(),
            kind: NotificationKind::Push,
            status: NotificationStatus::Pending,
            data: None,
            user_cpf: None,
            user_phone: None,
            user_email: None,
            group_id: None,
            broadcast: true,
            is_html: false,
            is_scheduled: false,
            scheduled_for: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            read_at: None,
        };

        assert!(push_payload(&n).get("data").is_none());
    }
}
