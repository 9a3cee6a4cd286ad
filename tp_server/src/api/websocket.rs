//! WebSocket push channel for room events.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?token=<jwt_token>`
//! 2. Server validates the token and registers the connection with the hub
//! 3. Every event for the user's rooms is forwarded as one JSON text frame:
//!    `{"event": "player_joined", "payload": {...}}`
//! 4. On disconnect the hub registration is dropped
//!
//! The channel is push only. Room operations go through the HTTP API;
//! client text frames are ignored.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws?token=eyJhbGc...');
//!
//! ws.onmessage = (msg) => {
//!   const { event, payload } = JSON.parse(msg.data);
//!   if (event === 'game_countdown_update') {
//!     showCountdown(payload.seconds_remaining);
//!   }
//! };
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info};
use serde::Deserialize;
use teen_patti::{db::RoomStore, room::UserId};

use super::{AppState, errors::ApiError};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Upgrade HTTP connection to WebSocket for event delivery.
///
/// # Query Parameters
///
/// - `token`: JWT access token for authentication
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// On authentication failure, returns `401 Unauthorized`.
pub async fn websocket_handler<S: RoomStore>(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState<S>>,
) -> Response {
    let user_id = match state.identity.verify(&query.token) {
        Ok(claims) => claims.sub,
        Err(e) => {
            log_security_event("invalid_ws_token", None, &format!("WebSocket token rejected: {e}"));
            return ApiError::unauthorized().into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Forward hub events to the socket until either side goes away.
async fn handle_socket<S: RoomStore>(socket: WebSocket, user_id: UserId, state: AppState<S>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.hub.connect(user_id).await;

    info!("WebSocket connected: user={}", user_id);
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(1.0);

    loop {
        tokio::select! {
            event = events.recv() => {
                // None: a newer connection for this user replaced ours.
                let Some(event) = event else { break };
                let json = match serde_json::to_string(event.as_ref()) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {} event: {}", event.name(), e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                metrics::websocket_events_sent();
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket error for user {}: {}", user_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.hub.disconnect(user_id, events).await;
    metrics::websocket_connections_active(-1.0);
    info!("WebSocket disconnected: user={}", user_id);
}
