//! WebSocket handler for real-time play.
//!
//! Every socket is one table connection. Frames in both directions are JSON
//! envelopes `{"event": <name>, "data": <payload>}`.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server assigns a fresh connection id and registers an event channel
//!    with the table actor
//! 3. A send task forwards table events to the socket as they happen
//! 4. Incoming frames are rate limited, parsed and forwarded as actions
//! 5. When the socket closes the table is told the connection left
//!
//! # Client Events
//!
//! | event                 | data                                  |
//! |-----------------------|---------------------------------------|
//! | `join-game`           | `{"name": "...", "secretKey": "..."}` |
//! | `send-chat`           | `"text"`                              |
//! | `host-open-betting`   | ticket price                          |
//! | `buy-ticket`          |                                       |
//! | `host-approve-player` | connection id                         |
//! | `host-revoke-player`  | connection id                         |
//! | `host-start-game`     |                                       |
//! | `call-number`         |                                       |
//! | `request-check-win`   | rows of number-or-null cells          |
//! | `reset-game`          |                                       |
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//! ws.onopen = () => ws.send(JSON.stringify({event: 'join-game', data: {name: 'Alice'}}));
//! ws.onmessage = (msg) => {
//!   const {event, data} = JSON.parse(msg.data);
//!   if (event === 'new-number') markNumber(data);
//! };
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use loto::{
    entities::{Chips, ConnectionId},
    sheet::Cell,
    table::PlayerAction,
};
use serde::Deserialize;

use super::{AppState, rate_limiter::FrameLimiter};
use crate::{logging, metrics};

/// Largest accepted frame
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Events received from clients
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinGame(JoinRequest),
    SendChat(String),
    HostOpenBetting(Chips),
    BuyTicket,
    HostApprovePlayer(ConnectionId),
    HostRevokePlayer(ConnectionId),
    HostStartGame,
    CallNumber,
    RequestCheckWin(Vec<Vec<Cell>>),
    ResetGame,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl ClientEvent {
    /// Wire name, used as a metrics label
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientEvent::JoinGame(_) => "join-game",
            ClientEvent::SendChat(_) => "send-chat",
            ClientEvent::HostOpenBetting(_) => "host-open-betting",
            ClientEvent::BuyTicket => "buy-ticket",
            ClientEvent::HostApprovePlayer(_) => "host-approve-player",
            ClientEvent::HostRevokePlayer(_) => "host-revoke-player",
            ClientEvent::HostStartGame => "host-start-game",
            ClientEvent::CallNumber => "call-number",
            ClientEvent::RequestCheckWin(_) => "request-check-win",
            ClientEvent::ResetGame => "reset-game",
        }
    }
}

impl From<ClientEvent> for PlayerAction {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::JoinGame(join) => PlayerAction::Join {
                name: join.name,
                secret: join.secret_key,
            },
            ClientEvent::SendChat(text) => PlayerAction::Chat { text },
            ClientEvent::HostOpenBetting(price) => PlayerAction::OpenBetting { price },
            ClientEvent::BuyTicket => PlayerAction::BuyTicket,
            ClientEvent::HostApprovePlayer(target) => PlayerAction::Approve { target },
            ClientEvent::HostRevokePlayer(target) => PlayerAction::Revoke { target },
            ClientEvent::HostStartGame => PlayerAction::StartGame,
            ClientEvent::CallNumber => PlayerAction::CallNumber,
            ClientEvent::RequestCheckWin(rows) => PlayerAction::CheckWin { rows },
            ClientEvent::ResetGame => PlayerAction::Reset,
        }
    }
}

/// Upgrade HTTP connection to WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Runs until the client goes away or the table shuts down, then tells the
/// table the connection left.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    let (mut sender, mut receiver) = socket.split();

    let mut events = match state.table.connect(connection_id).await {
        Ok(events) => events,
        Err(e) => {
            error!("Cannot register connection {connection_id}: {e}");
            return;
        }
    };

    metrics::websocket_connection_opened();
    info!("WebSocket connected: {connection_id}");

    // Forward table events until the table drops our channel or the socket dies
    let send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize event: {e}");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
            metrics::websocket_messages_sent();
        }
        let _ = sender.close().await;
    });

    let mut limiter = FrameLimiter::default();
    let connection_label = connection_id.to_string();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(window) = limiter.check() {
                    metrics::rate_limit_hits_total(window.as_str());
                    logging::log_security_event(
                        "rate_limited",
                        &connection_label,
                        &format!("{} limit exceeded, frame dropped", window.as_str()),
                    );
                    continue;
                }

                let Some(event) = parse_client_event(text.as_str()) else {
                    continue;
                };
                metrics::websocket_messages_received(event.event_name());

                if state.table.act(connection_id, event.into()).await.is_err() {
                    warn!("Table closed while {connection_id} was connected");
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!("WebSocket close frame from {connection_id}");
                break;
            }
            Err(e) => {
                warn!("WebSocket error on {connection_id}: {e}");
                break;
            }
            _ => {}
        }
    }

    let _ = state.table.disconnect(connection_id).await;
    send_task.abort();
    metrics::websocket_connection_closed();

    info!("WebSocket disconnected: {connection_id}");
}

/// Parse a text frame. Malformed frames are logged and dropped.
fn parse_client_event(text: &str) -> Option<ClientEvent> {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to parse client frame: {e}");
            metrics::websocket_invalid_messages();
            None
        }
    }
}
