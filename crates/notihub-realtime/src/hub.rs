//! The socket hub actor.
//!
//! One long-lived event loop owns the `user id -> sockets` table. All
//! mutations arrive over three unbounded command channels (register,
//! unregister, deliver), so callers never contend on a lock and never block
//! beyond a channel send. Outbound pushes use non-blocking sends into each
//! socket's bounded buffer; a socket whose buffer is full is evicted
//! (drop-the-slow-consumer backpressure).

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use notihub_entity::notification::Notification;

use crate::client::{SocketClient, SocketId};

/// Cloneable handle to the hub event loop.
#[derive(Debug, Clone)]
pub struct SocketHub {
    register_tx: mpsc::UnboundedSender<SocketClient>,
    unregister_tx: mpsc::UnboundedSender<(String, SocketId)>,
    deliver_tx: mpsc::UnboundedSender<Notification>,
}

impl SocketHub {
    /// Create the hub and spawn its event loop.
    pub fn new() -> Self {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (deliver_tx, deliver_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_event_loop(register_rx, unregister_rx, deliver_rx));

        Self {
            register_tx,
            unregister_tx,
            deliver_tx,
        }
    }

    /// Register a socket under its user identifier.
    pub fn register(&self, client: SocketClient) {
        if self.register_tx.send(client).is_err() {
            warn!("Socket hub is not running, register dropped");
        }
    }

    /// Remove a socket from the hub.
    pub fn unregister(&self, user_id: String, socket_id: SocketId) {
        if self.unregister_tx.send((user_id, socket_id)).is_err() {
            warn!("Socket hub is not running, unregister dropped");
        }
    }

    /// Route a notification to the matching live sockets.
    ///
    /// Broadcasts fan out to every socket; directed notifications reach the
    /// sockets registered under the first non-empty of CPF and phone. Never
    /// fails synchronously: delivery to a dead hub is logged and dropped.
    pub fn deliver(&self, notification: Notification) {
        if self.deliver_tx.send(notification).is_err() {
            warn!("Socket hub is not running, delivery dropped");
        }
    }
}

impl Default for SocketHub {
    fn default() -> Self {
        Self::new()
    }
}

/// The hub's single event loop; exclusive owner of the socket table.
async fn run_event_loop(
    mut register_rx: mpsc::UnboundedReceiver<SocketClient>,
    mut unregister_rx: mpsc::UnboundedReceiver<(String, SocketId)>,
    mut deliver_rx: mpsc::UnboundedReceiver<Notification>,
) {
    let mut clients: HashMap<String, HashMap<SocketId, mpsc::Sender<String>>> = HashMap::new();

    info!("Socket hub event loop started");

    loop {
        tokio::select! {
            // Table mutations drain before deliveries so that a socket
            // registered (or removed) before a deliver was issued is
            // visible to that deliver.
            biased;

            client = register_rx.recv() => match client {
                Some(client) => {
                    debug!(socket_id = %client.id, user_id = %client.user_id, "Socket registered");
                    clients
                        .entry(client.user_id)
                        .or_default()
                        .insert(client.id, client.tx);
                }
                None => break,
            },
            removal = unregister_rx.recv() => match removal {
                Some((user_id, socket_id)) => {
                    if let Some(sockets) = clients.get_mut(&user_id) {
                        if sockets.remove(&socket_id).is_some() {
                            debug!(socket_id = %socket_id, user_id = %user_id, "Socket unregistered");
                        }
                        if sockets.is_empty() {
                            clients.remove(&user_id);
                        }
                    }
                }
                None => break,
            },
            notification = deliver_rx.recv() => match notification {
                Some(notification) => dispatch(&mut clients, &notification),
                None => break,
            },
        }
    }

    info!("Socket hub event loop stopped");
}

/// Push one notification onto the matching sockets, evicting any socket
/// whose outbound buffer is full or closed.
fn dispatch(
    clients: &mut HashMap<String, HashMap<SocketId, mpsc::Sender<String>>>,
    notification: &Notification,
) {
    let frame = match serde_json::to_string(notification) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(notification_id = %notification.id, error = %e, "Failed to serialize notification");
            return;
        }
    };

    if notification.broadcast {
        let mut evicted: Vec<(String, SocketId)> = Vec::new();
        for (user_id, sockets) in clients.iter() {
            for (socket_id, tx) in sockets.iter() {
                if tx.try_send(frame.clone()).is_err() {
                    evicted.push((user_id.clone(), *socket_id));
                }
            }
        }
        evict(clients, evicted);
        return;
    }

    let Some(target) = notification.target_user_id() else {
        debug!(notification_id = %notification.id, "No socket target, skipping in-app delivery");
        return;
    };

    if let Some(sockets) = clients.get(target) {
        let mut evicted: Vec<(String, SocketId)> = Vec::new();
        for (socket_id, tx) in sockets.iter() {
            if tx.try_send(frame.clone()).is_err() {
                evicted.push((target.to_string(), *socket_id));
            }
        }
        evict(clients, evicted);
    }
}

fn evict(
    clients: &mut HashMap<String, HashMap<SocketId, mpsc::Sender<String>>>,
    evicted: Vec<(String, SocketId)>,
) {
    for (user_id, socket_id) in evicted {
        warn!(socket_id = %socket_id, user_id = %user_id, "Evicting slow socket");
        if let Some(sockets) = clients.get_mut(&user_id) {
            sockets.remove(&socket_id);
            if sockets.is_empty() {
                clients.remove(&user_id);
            }
        }
    }
}
