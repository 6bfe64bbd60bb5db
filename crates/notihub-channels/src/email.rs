//! Email relay channel adapter.
//!
//! Posts a JSON envelope to the external relay's `/data/mailman` endpoint
//! with an `x-api-key` header. Any non-2xx status is an error and
//! propagates to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use notihub_core::config::EmailRelayConfig;
use notihub_core::error::AppError;
use notihub_core::result::AppResult;

/// JSON envelope accepted by the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Primary recipients.
    pub to_addresses: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cc_addresses: Vec<String>,
    /// Blind-carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bcc_addresses: Vec<String>,
    /// Reply-to addresses.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reply_to: Vec<String>,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Whether the body is HTML.
    pub is_html_body: bool,
}

/// Client for the external email relay.
#[derive(Debug, Clone)]
pub struct EmailRelayClient {
    http: reqwest::Client,
    config: EmailRelayConfig,
}

impl EmailRelayClient {
    /// Create a new relay client.
    pub fn new(config: EmailRelayConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Send one e-mail through the relay.
    pub async fn send(&self, request: &EmailRequest) -> AppResult<()> {
        if request.to_addresses.is_empty() {
            return Err(AppError::validation("to_addresses is required"));
        }
        if request.subject.is_empty() {
            return Err(AppError::validation("subject is required"));
        }
        if request.body.is_empty() {
            return Err(AppError::validation("body is required"));
        }

        let endpoint = format!("{}/data/mailman", self.config.url.trim_end_matches('/'));
        debug!(to = ?request.to_addresses, endpoint = %endpoint, "Sending email via relay");

        let response = self
            .http
            .post(&endpoint)
            .header("accept", "application/json")
            .header("x-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Email relay request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Email relay accepted the message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Email relay rejected the message");
        Err(AppError::external_service(format!(
            "Email relay returned status {status}: {body}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_field_names() {
        let request = EmailRequest {
            to_addresses: vec!["x@y".to_string()],
            subject: "S".to_string(),
            body: "<b>B</b>".to_string(),
            is_html_body: true,
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["to_addresses"][0], "x@y");
        assert_eq!(value["is_html_body"], true);
        // Empty optional lists are omitted entirely.
        assert!(value.get("cc_addresses").is_none());
        assert!(value.get("reply_to").is_none());
    }

    #[tokio::test]
    async fn test_send_rejects_empty_fields() {
        let client = EmailRelayClient::new(EmailRelayConfig::default()).unwrap();

        let empty_to = EmailRequest {
            subject: "s".to_string(),
            body: "b".to_string(),
            ..Default::default()
        };
        assert!(client.send(&empty_to).await.is_err());

        let empty_subject = EmailRequest {
            to_addresses: vec!["x@y".to_string()],
            body: "b".to_string(),
            ..Default::default()
        };
        assert!(client.send(&empty_subject).await.is_err());
    }
}
