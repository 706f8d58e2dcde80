//! WebSocket event delivery (spec.md §4.8/§6.4): subscribes to a room's
//! Event Bus and forwards each [`debate_registry::RoomEvent`] as a JSON
//! frame. Grounded on the teacher's `WebSocketHandler::handle`
//! (`server/src/websocket.rs`): upgrade, spawn a forwarding task per
//! connection, close on the subscriber's own disconnect rather than
//! lingering.
//!
//! The core is transport-agnostic (spec.md §6.4: "the HTTP/WebSocket layer
//! translates them"); this module is that translation, and nothing else —
//! nobody calls back into the registry except as a courtesy initial
//! snapshot.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use debate_core::{Stage, UtteranceKind};
use debate_registry::RoomEvent;
use serde::Serialize;

use crate::state::AppState;

/// Wire shape of a `RoomEvent`, serialized as a tagged JSON object the way
/// spec.md §4.8 lists event names: `turn_started`, `thinking`,
/// `new_message`, `stage_changed`, `room_ended`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WsEvent {
    TurnStarted { speaker_id: String, kind: UtteranceKind, is_user: bool },
    Thinking { speaker_id: String },
    NewMessage { utterance: debate_core::Utterance },
    StageChanged { from: Stage, to: Stage },
    RoomEnded { reason: String },
}

impl From<RoomEvent> for WsEvent {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::TurnStarted { speaker_id, kind, is_user } => WsEvent::TurnStarted { speaker_id, kind, is_user },
            RoomEvent::Thinking { speaker_id } => WsEvent::Thinking { speaker_id },
            RoomEvent::NewMessage { utterance } => WsEvent::NewMessage { utterance },
            RoomEvent::StageChanged { from, to } => WsEvent::StageChanged { from, to },
            RoomEvent::RoomEnded { reason } => WsEvent::RoomEnded { reason },
        }
    }
}

/// WebSocket message envelope clients receive over `/ws/:room_id`.
/// `Error` covers the one failure mode a subscriber can observe directly:
/// a slow-consumer disconnect (spec.md §4.8 `SLOW_CONSUMER`), surfaced as a
/// final frame before the socket closes rather than a silent drop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Event(WsEvent),
    Error { message: String, kind: &'static str },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Response {
    match state.registry.get(&room_id) {
        Ok(handle) => ws.on_upgrade(move |socket| forward_events(socket, handle)),
        Err(err) => {
            // Upgrading first and then immediately closing keeps the HTTP
            // contract simple for clients that always expect a 101, the
            // same tradeoff the teacher's handler makes for unknown
            // sessions.
            ws.on_upgrade(move |socket| reject_unknown_room(socket, err))
        }
    }
}

async fn reject_unknown_room(mut socket: WebSocket, err: debate_core::Error) {
    let frame = WsMessage::Error { message: err.to_string(), kind: err.kind() };
    if let Ok(text) = serde_json::to_string(&frame) {
        let _ = socket.send(Message::Text(text)).await;
    }
    let _ = socket.close().await;
}

/// The forwarding loop itself: per spec.md §4.8 "late subscribers receive
/// only events produced after subscription", `subscribe()` is called right
/// before the loop starts, not before the upgrade — a subscriber that
/// disconnects mid-handshake never sees events meant for someone else.
async fn forward_events(mut socket: WebSocket, handle: std::sync::Arc<debate_registry::RoomHandle>) {
    let mut events = handle.events.subscribe();
    loop {
        tokio::select! {
            received = events.recv() => {
                match received {
                    Ok(event) => {
                        let frame = WsMessage::Event(event.into());
                        let Ok(text) = serde_json::to_string(&frame) else { continue };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let frame = WsMessage::Error { message: err.to_string(), kind: err.kind() };
                        if let Ok(text) = serde_json::to_string(&frame) {
                            let _ = socket.send(Message::Text(text)).await;
                        }
                        let _ = socket.close().await;
                        break;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                }
            }
        }
    }
}
