//! SketchRoom WebSocket Relay Server
//!
//! Relays full history snapshots between clients in the same room and keeps
//! the latest snapshot of each room for members who join later.
//!
//! ## Protocol
//!
//! JSON text frames of the form `{"event": ..., "data": ...}`:
//! ```json
//! {"event": "join", "data": {"room": "lobby"}}
//! {"event": "history-changed", "data": {"room": "lobby", "drawings": [...]}}
//! ```
//! Peers receive `history-changed` (bare history) from other members,
//! `member-joined-snapshot` right after joining a room that has history, and
//! `error` when a frame is rejected.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use sketchroom_core::room::RoomName;
use sketchroom_core::stroke::History;
use sketchroom_core::sync::{ClientMessage, ServerMessage};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Room broadcast: sending peer id and the message to relay.
type RoomEvent = (String, ServerMessage);

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<RoomEvent>,
    /// Connected peer IDs
    peers: HashSet<String>,
    /// Latest history snapshot (for new joiners)
    history: Option<History>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            history: None,
        }
    }
}

/// Shared relay state
#[derive(Default)]
pub struct AppState {
    /// Active rooms
    rooms: DashMap<RoomName, Room>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Stored snapshot of a room, if any.
    pub fn history(&self, room: &RoomName) -> Option<History> {
        self.rooms.get(room).and_then(|room| room.history.clone())
    }

    /// Add peer to room, creating it on demand.
    fn join_room(&self, room: &RoomName, peer_id: &str) -> (broadcast::Receiver<RoomEvent>, Option<History>) {
        let mut entry = self.rooms.entry(room.clone()).or_insert_with(Room::new);
        entry.peers.insert(peer_id.to_string());
        (entry.tx.subscribe(), entry.history.clone())
    }

    /// Remove peer from room; empty rooms are dropped with their history.
    fn leave_room(&self, room: &RoomName, peer_id: &str) {
        if let Some(mut entry) = self.rooms.get_mut(room) {
            entry.peers.remove(peer_id);
        }
        // Re-checked under the shard lock: a peer may have joined in between.
        if self.rooms.remove_if(room, |_, r| r.peers.is_empty()).is_some() {
            debug!("Room {} dropped", room);
        }
    }

    /// Store a room's snapshot and relay it to the other members.
    fn update_history(&self, room: &RoomName, from: &str, history: History) {
        if let Some(mut entry) = self.rooms.get_mut(room) {
            entry.history = Some(history.clone());
            let _ = entry
                .tx
                .send((from.to_string(), ServerMessage::HistoryChanged(history)));
        }
    }
}

/// Build the relay router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay on an already bound listener until the process exits.
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// Index page
async fn index() -> &'static str {
    "SketchRoom Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_message(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> Result<(), axum::Error> {
    match msg.to_json() {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to encode message: {}", e);
            Ok(())
        }
    }
}

fn error_message(message: impl Into<String>) -> ServerMessage {
    ServerMessage::Error {
        message: message.into(),
    }
}

/// Next event from the joined room. Pends while no room is joined; a closed
/// channel detaches the receiver.
async fn next_room_event(room_rx: &mut Option<broadcast::Receiver<RoomEvent>>) -> Option<RoomEvent> {
    loop {
        let Some(rx) = room_rx.as_mut() else {
            return std::future::pending().await;
        };
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Room receiver lagged, skipped {} messages", skipped);
            }
            Err(RecvError::Closed) => {
                *room_rx = None;
                return None;
            }
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<RoomName> = None;
    let mut room_rx: Option<broadcast::Receiver<RoomEvent>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                let reply = match msg {
                    Some(Ok(Message::Text(text))) => match ClientMessage::from_json(&text) {
                        Ok(ClientMessage::Join { room }) => {
                            // Leave current room if any
                            if let Some(old_room) = current_room.take() {
                                state.leave_room(&old_room, &peer_id);
                            }

                            let (rx, history) = state.join_room(&room, &peer_id);
                            room_rx = Some(rx);
                            info!("Peer {} joined room {}", peer_id, room);
                            current_room = Some(room);
                            history.map(ServerMessage::MemberJoinedSnapshot)
                        }
                        Ok(ClientMessage::HistoryChanged { room, drawings }) => {
                            if current_room.as_ref() == Some(&room) {
                                debug!("Peer {} updated room {} ({} strokes)", peer_id, room, drawings.len());
                                state.update_history(&room, &peer_id, drawings);
                                None
                            } else {
                                warn!("Peer {} sent history for room {} it has not joined", peer_id, room);
                                Some(error_message(format!("Not a member of room {}", room)))
                            }
                        }
                        Err(e) => {
                            warn!("Invalid message from {}: {}", peer_id, e);
                            Some(error_message(format!("Invalid message: {}", e)))
                        }
                    },
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Binary frame from {} rejected", peer_id);
                        Some(error_message("Binary frames are not supported"))
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => None, // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                };

                if let Some(reply) = reply {
                    if send_message(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
            }

            // Handle broadcast messages from room
            msg = next_room_event(&mut room_rx) => {
                if let Some((from, server_msg)) = msg {
                    // Don't echo back to sender
                    if from != peer_id && send_message(&mut sender, &server_msg).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}
