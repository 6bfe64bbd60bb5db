//! Individual socket handle registered with the hub.

use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique socket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub Uuid);

impl SocketId {
    /// Creates a new random socket ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live socket as seen by the hub: its identity plus the bounded sender
/// feeding the socket's writer task.
#[derive(Debug, Clone)]
pub struct SocketClient {
    /// Unique socket identifier.
    pub id: SocketId,
    /// User identifier this socket is registered under.
    pub user_id: String,
    /// Bounded outbound buffer; the hub never awaits on this sender.
    pub tx: mpsc::Sender<String>,
}

impl SocketClient {
    /// Create a client handle with an outbound buffer of `buffer_size`
    /// frames, returning the receiving half for the socket's writer task.
    pub fn new(user_id: String, buffer_size: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (
            Self {
                id: SocketId::new(),
                user_id,
                tx,
            },
            rx,
        )
    }
}
