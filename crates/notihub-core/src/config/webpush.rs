//! Web Push (VAPID) configuration.

use serde::{Deserialize, Serialize};

/// VAPID keypair and subject used to authenticate Web Push sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebPushConfig {
    /// Base64url-encoded VAPID public key.
    #[serde(default)]
    pub vapid_public_key: String,
    /// Base64url-encoded VAPID private key.
    #[serde(default)]
    pub vapid_private_key: String,
    /// VAPID subject, usually a `mailto:` URL.
    #[serde(default)]
    pub vapid_subject: String,
}

impl WebPushConfig {
    /// Whether the VAPID keypair is configured.
    pub fn is_configured(&self) -> bool {
        !self.vapid_public_key.is_empty() && !self.vapid_private_key.is_empty()
    }
}
