//! Real-time socket hub configuration.

use serde::{Deserialize, Serialize};

/// Socket hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-socket outbound buffer size; a socket whose buffer is full at
    /// delivery time is evicted.
    #[serde(default = "default_socket_buffer")]
    pub socket_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            socket_buffer_size: default_socket_buffer(),
        }
    }
}

fn default_socket_buffer() -> usize {
    256
}
