use std::sync::Arc;
use axum::{
    extract::{Query, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::state::AppState;
use crate::ws::RelayHandle;

#[derive(Deserialize, Debug, Default)]
pub struct ConnectParams {
    /// Display name used for presence, optional at handshake.
    pub user: Option<String>,
}

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt (user: {:?})", params.user);
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, params.user, relay))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, user: Option<String>, relay: RelayHandle) {

    // Register first so the catch-up envelope is queued before anything else
    let (connection_id, mut outbound) = match relay.register(user) {
        Ok(registered) => registered,
        Err(e) => {
            error!("Failed to register WebSocket connection: {}", e);
            return;
        }
    };
    info!("WebSocket connection established with connection_id: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Drain this connection's queue into the socket, in order
    let mut send_task = tokio::spawn(async move {
        while let Some(envelope) = outbound.recv().await {
            if sender.send(Message::Text(envelope.encode())).await.is_err() {
                debug!("Socket closed while sending to {}", connection_id);
                break;
            }
        }
    });

    // Hand every text frame to the relay; anything else is skipped
    let inbound = relay.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if inbound.inbound(connection_id, text).is_err() {
                        error!("Relay stopped, closing connection {}", connection_id);
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => continue,
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.unregister(connection_id);
    info!("WebSocket connection {} terminated", connection_id);
}
