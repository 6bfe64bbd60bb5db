//! WebSocket upgrade handler.
//!
//! `GET /api/v1/ws?user_id=...` upgrades the connection and joins the hub
//! under that user id. Each connection runs the standard two-task pattern:
//! this task reads client frames, a spawned task drains the hub's outbound
//! buffer into the socket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use notihub_core::error::AppError;
use notihub_realtime::SocketClient;

use crate::state::AppState;

/// Query parameters for the WebSocket upgrade.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// User identifier to register the socket under.
    pub user_id: String,
}

/// GET /api/v1/ws?user_id={id} — WebSocket upgrade
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, AppError> {
    if query.user_id.is_empty() {
        return Err(AppError::bad_request("user_id is required"));
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(state, query.user_id, socket)))
}

/// Drives one established WebSocket connection.
async fn handle_socket(state: AppState, user_id: String, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (client, mut outbound_rx) = SocketClient::new(
        user_id.clone(),
        state.config.realtime.socket_buffer_size,
    );
    let socket_id = client.id;
    state.hub.register(client);

    info!(socket_id = %socket_id, user_id = %user_id, "WebSocket connection established");

    // Writer task: hub outbound buffer -> socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        // Buffer closed (eviction or unregister): say goodbye if possible.
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    // Reader loop: client frames are drained; only close matters.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(other) => {
                debug!(socket_id = %socket_id, frame = ?other, "Ignoring inbound frame");
            }
            Err(e) => {
                debug!(socket_id = %socket_id, error = %e, "WebSocket read error");
                break;
            }
        }
    }

    state.hub.unregister(user_id.clone(), socket_id);
    writer.abort();

    info!(socket_id = %socket_id, user_id = %user_id, "WebSocket connection closed");
}
