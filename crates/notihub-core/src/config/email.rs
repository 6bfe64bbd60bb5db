//! Email relay configuration.

use serde::{Deserialize, Serialize};

/// External email relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailRelayConfig {
    /// Base URL of the relay service.
    #[serde(default)]
    pub url: String,
    /// API key sent in the `x-api-key` header.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}
