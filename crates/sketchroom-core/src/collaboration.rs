//! Collaboration management for a shared room history.
//!
//! Every local mutation sends the whole history; every remote snapshot
//! replaces the whole local history. The last snapshot to arrive wins.

use crate::canvas::CanvasDocument;
use crate::room::RoomName;
use crate::stroke::History;
use crate::sync::{ClientMessage, ServerMessage};

/// A remote snapshot that was applied to the local document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteUpdate {
    /// Another member changed the history.
    HistoryChanged,
    /// The room's history as of our joining.
    MemberJoinedSnapshot,
}

/// Bridges local history mutations and remote snapshots for one room.
#[derive(Debug, Clone)]
pub struct CollaborationManager {
    room: RoomName,
    /// Whether the transport is currently connected.
    connected: bool,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
}

impl CollaborationManager {
    /// Create a manager for the given room. Nothing is queued until the
    /// transport connects.
    pub fn new(room: RoomName) -> Self {
        Self {
            room,
            connected: false,
            outgoing: Vec::new(),
        }
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The transport connected: queue the join request.
    pub fn on_connected(&mut self) {
        self.connected = true;
        log::info!("Joining room {}", self.room);
        self.queue(ClientMessage::Join {
            room: self.room.clone(),
        });
    }

    /// The transport went away. Anything still queued is lost.
    pub fn on_disconnected(&mut self) {
        if self.connected {
            log::info!("Disconnected from room {}", self.room);
        }
        self.connected = false;
        self.outgoing.clear();
    }

    /// Queue a full snapshot of `history` for the room.
    ///
    /// Dropped while disconnected; the room converges at the next snapshot
    /// exchange.
    pub fn broadcast_history(&mut self, history: &History) {
        if !self.connected {
            log::debug!("Not connected, dropping history broadcast ({} strokes)", history.len());
            return;
        }
        self.queue(ClientMessage::HistoryChanged {
            room: self.room.clone(),
            drawings: history.clone(),
        });
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    /// Check if there are pending outgoing messages.
    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Handle an incoming server message.
    ///
    /// A valid snapshot replaces the document's history (and clears its undo
    /// stack). Malformed messages and server errors are logged and leave the
    /// document untouched.
    pub fn handle_message(&mut self, json: &str, doc: &mut CanvasDocument) -> Option<RemoteUpdate> {
        let msg = match ServerMessage::from_json(json) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Ignoring malformed server message: {}", e);
                return None;
            }
        };

        match msg {
            ServerMessage::HistoryChanged(history) => {
                log::debug!("Remote history changed ({} strokes)", history.len());
                doc.replace_history(history);
                Some(RemoteUpdate::HistoryChanged)
            }
            ServerMessage::MemberJoinedSnapshot(history) => {
                log::debug!("Received room snapshot ({} strokes)", history.len());
                doc.replace_history(history);
                Some(RemoteUpdate::MemberJoinedSnapshot)
            }
            ServerMessage::Error { message } => {
                log::warn!("Server error: {}", message);
                None
            }
        }
    }

    fn queue(&mut self, msg: ClientMessage) {
        match msg.to_json() {
            Ok(json) => self.outgoing.push(json),
            Err(e) => log::error!("Failed to encode message: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{Segment, Stroke};
    use serde_json::json;

    fn manager() -> CollaborationManager {
        CollaborationManager::new(RoomName::parse("lobby").unwrap())
    }

    fn stroke(x0: f64, y0: f64, x1: f64, y1: f64) -> Stroke {
        Stroke::new(vec![Segment { x0, y0, x1, y1 }]).unwrap()
    }

    fn parse(json: &str) -> serde_json::Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_join_queued_on_connect() {
        let mut manager = manager();
        assert!(!manager.has_outgoing());

        manager.on_connected();
        let outgoing = manager.take_outgoing();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(parse(&outgoing[0]), json!({"event": "join", "data": {"room": "lobby"}}));
        assert!(!manager.has_outgoing());
    }

    #[test]
    fn test_broadcast_carries_full_history() {
        let mut manager = manager();
        manager.on_connected();
        manager.take_outgoing();

        let history = History::from(vec![stroke(0.0, 0.0, 1.0, 1.0)]);
        manager.broadcast_history(&history);

        let outgoing = manager.take_outgoing();
        assert_eq!(
            parse(&outgoing[0]),
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
    fn test_broadcast_dropped_while_disconnected() {
        let mut manager = manager();
        manager.broadcast_history(&History::from(vec![stroke(0.0, 0.0, 1.0, 1.0)]));
        assert!(!manager.has_outgoing());

        manager.on_connected();
        manager.on_disconnected();
        assert!(!manager.is_connected());
        assert!(!manager.has_outgoing());
    }

    #[test]
    fn test_remote_snapshot_replaces_history() {
        let mut manager = manager();
        let mut doc = CanvasDocument::with_history(History::from(vec![
            stroke(0.0, 0.0, 1.0, 1.0),
            stroke(7.0, 7.0, 8.0, 8.0),
        ]));
        doc.undo();
        assert_eq!(doc.history().len(), 1);
        assert!(doc.can_redo());

        let update = manager.handle_message(
            r#"{"event":"history-changed","data":[[{"x0":2,"y0":3,"x1":4,"y1":5}]]}"#,
            &mut doc,
        );

        assert_eq!(update, Some(RemoteUpdate::HistoryChanged));
        assert_eq!(doc.history(), &History::from(vec![stroke(2.0, 3.0, 4.0, 5.0)]));
        assert!(doc.undo_stack().is_empty());
    }

    #[test]
    fn test_member_joined_snapshot_clears_undo_stack() {
        let mut manager = manager();
        let mut doc = CanvasDocument::with_history(History::from(vec![stroke(0.0, 0.0, 1.0, 1.0)]));
        doc.undo();
        assert!(doc.can_redo());

        let update = manager.handle_message(r#"{"event":"member-joined-snapshot","data":[]}"#, &mut doc);

        assert_eq!(update, Some(RemoteUpdate::MemberJoinedSnapshot));
        assert!(doc.history().is_empty());
        assert!(!doc.can_redo());
    }

    #[test]
    fn test_malformed_message_leaves_history() {
        let mut manager = manager();
        let original = History::from(vec![stroke(0.0, 0.0, 1.0, 1.0)]);
        let mut doc = CanvasDocument::with_history(original.clone());

        for json in [
            r#"{"event":"history-changed","data":{"not":"a sequence"}}"#,
            r#"{"event":"history-changed","data":[[]]}"#,
            r#"{"event":"member-joined-snapshot","data":[[{"x0":1}]]}"#,
            r#"{"event":"error","data":{"message":"nope"}}"#,
            "garbage",
        ] {
            assert_eq!(manager.handle_message(json, &mut doc), None);
            assert_eq!(doc.history(), &original);
        }
    }
}
