//! Wire protocol and WebSocket transport for room synchronization.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`:
//!
//! ```json
//! {"event": "join", "data": {"room": "lobby"}}
//! {"event": "history-changed", "data": {"room": "lobby", "drawings": [[{"x0":0,"y0":0,"x1":1,"y1":1}]]}}
//! {"event": "history-changed", "data": [[{"x0":0,"y0":0,"x1":1,"y1":1}]]}
//! {"event": "member-joined-snapshot", "data": []}
//! ```
//!
//! The history is always sent whole; there is no operation log.

use crate::room::RoomName;
use crate::stroke::History;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Synchronization errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join a room.
    Join { room: RoomName },
    /// Full history snapshot after a local change.
    HistoryChanged { room: RoomName, drawings: History },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Another member changed the room history.
    HistoryChanged(History),
    /// Current room history, sent to a member right after it joins.
    MemberJoinedSnapshot(History),
    /// The server rejected a message.
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Connected to server
    Connected,
    /// Disconnected from server
    Disconnected,
    /// A text frame from the server (not yet parsed)
    Message(String),
    /// Error occurred
    Error { message: String },
}

/// A persistent connection that carries protocol frames.
///
/// Implementations must not block: `send` queues or writes immediately and
/// `poll_events` returns whatever arrived since the last poll.
pub trait Transport {
    /// Send a text frame.
    fn send(&self, msg: &str) -> Result<(), SyncError>;

    /// Drain pending events.
    fn poll_events(&mut self) -> Vec<SyncEvent>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

// ============================================================================
// Native WebSocket Client
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        state: ConnectionState,
        events: Vec<SyncEvent>,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to a WebSocket server.
        pub fn connect(&mut self, url: &str) -> Result<(), SyncError> {
            if self.cmd_tx.is_some() {
                return Err(SyncError::AlreadyConnected);
            }

            validate_url(url)?;
            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();

            let url = url.to_string();
            let handle = thread::spawn(move || run_socket(&url, cmd_rx, event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        /// Disconnect from the server.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }
    }

    impl Transport for NativeWebSocket {
        fn send(&self, msg: &str) -> Result<(), SyncError> {
            match self.cmd_tx {
                Some(ref tx) => tx
                    .send(WsCommand::Send(msg.to_string()))
                    .map_err(|e| SyncError::SendFailed(e.to_string())),
                None => Err(SyncError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        SyncEvent::Connected => self.state = ConnectionState::Connected,
                        SyncEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        SyncEvent::Error { .. } => self.state = ConnectionState::Error,
                        SyncEvent::Message(_) => {}
                    }
                    self.events.push(event);
                }
            }

            std::mem::take(&mut self.events)
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }

    /// Accept only `ws://` and `wss://` URLs.
    pub fn validate_url(url: &str) -> Result<Url, SyncError> {
        let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(parsed)
    }

    /// Socket thread body: connect, then alternate between draining commands
    /// and reading frames until either side closes.
    fn run_socket(url: &str, cmd_rx: Receiver<WsCommand>, event_tx: Sender<SyncEvent>) {
        log::info!("WebSocket thread: connecting to {}", url);

        let mut socket = match connect(url) {
            Ok((socket, response)) => {
                log::info!("WebSocket connected, status: {}", response.status());
                socket
            }
            Err(e) => {
                log::error!("WebSocket connection failed: {}", e);
                let _ = event_tx.send(SyncEvent::Error {
                    message: format!("Connection failed: {}", e),
                });
                return;
            }
        };
        let _ = event_tx.send(SyncEvent::Connected);

        // Short read timeout so commands are serviced promptly.
        match socket.get_mut() {
            tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
            }
            #[allow(unreachable_patterns)]
            _ => {
                log::debug!("TLS or other stream - using default timeout handling");
            }
        }

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    log::debug!("WebSocket sending {} bytes", msg.len());
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("WebSocket send error: {}", e);
                        break;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => {
                    log::debug!("WebSocket received {} bytes", txt.len());
                    if event_tx.send(SyncEvent::Message(txt)).is_err() {
                        break;
                    }
                }
                Ok(Message::Ping(data)) => {
                    let _ = socket.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => {
                    log::info!("WebSocket received close frame");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }

        log::info!("WebSocket thread exiting");
        let _ = event_tx.send(SyncEvent::Disconnected);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_client::{NativeWebSocket, validate_url};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{Segment, Stroke};
    use serde_json::json;

    fn room(name: &str) -> RoomName {
        RoomName::parse(name).unwrap()
    }

    fn one_stroke(x0: f64, y0: f64, x1: f64, y1: f64) -> History {
        History::from(vec![Stroke::new(vec![Segment { x0, y0, x1, y1 }]).unwrap()])
    }

    #[test]
    fn test_join_serialize() {
        let msg = ClientMessage::Join { room: room("test-room") };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"event": "join", "data": {"room": "test-room"}}));
    }

    #[test]
    fn test_history_changed_serialize() {
        let msg = ClientMessage::HistoryChanged {
            room: room("lobby"),
            drawings: one_stroke(0.0, 0.0, 1.0, 1.0),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "history-changed",
                "data": {
                    "room": "lobby",
                    "drawings": [[{"x0": 0.0, "y0": 0.0, "x1": 1.0, "y1": 1.0}]]
                }
            })
        );
    }

    #[test]
    fn test_server_snapshot_deserialize() {
        let json = r#"{"event":"member-joined-snapshot","data":[[{"x0":2,"y0":3,"x1":4,"y1":5}]]}"#;
        let msg = ServerMessage::from_json(json).unwrap();
        assert_eq!(msg, ServerMessage::MemberJoinedSnapshot(one_stroke(2.0, 3.0, 4.0, 5.0)));

        let json = r#"{"event":"history-changed","data":[]}"#;
        assert_eq!(
            ServerMessage::from_json(json).unwrap(),
            ServerMessage::HistoryChanged(History::new())
        );
    }

    #[test]
    fn test_server_rejects_non_sequence_payload() {
        for json in [
            r#"{"event":"history-changed","data":{"room":"x"}}"#,
            r#"{"event":"history-changed","data":"nope"}"#,
            r#"{"event":"history-changed"}"#,
            r#"{"event":"unknown","data":[]}"#,
            r#"not json"#,
        ] {
            assert!(
                matches!(ServerMessage::from_json(json), Err(SyncError::Malformed(_))),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn test_client_rejects_empty_room() {
        let json = r#"{"event":"join","data":{"room":"  "}}"#;
        assert!(ClientMessage::from_json(json).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("ws://localhost:3030/ws").is_ok());
        assert!(validate_url("wss://example.com/ws").is_ok());
        assert!(matches!(validate_url("http://localhost"), Err(SyncError::InvalidUrl(_))));
        assert!(matches!(validate_url("not a url"), Err(SyncError::InvalidUrl(_))));
    }

    #[test]
    fn test_native_socket_requires_connection() {
        let mut socket = NativeWebSocket::new();
        assert_eq!(socket.state(), ConnectionState::Disconnected);
        assert!(matches!(socket.send("{}"), Err(SyncError::NotConnected)));
        assert!(socket.poll_events().is_empty());
        assert!(matches!(socket.connect("ftp://x"), Err(SyncError::InvalidUrl(_))));
    }
}
