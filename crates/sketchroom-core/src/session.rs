//! One client's drawing session: the canvas, its input controller and the
//! room synchronization, driven from a single thread.

use crate::canvas::Canvas;
use crate::collaboration::CollaborationManager;
use crate::input::{GestureState, InputController, InputResponse, KeyBindings, KeyEvent, PointerEvent, Redraw};
use crate::room::RoomName;
use crate::sync::{SyncEvent, Transport};

/// Everything a client needs between events.
#[derive(Debug, Clone)]
pub struct Session {
    canvas: Canvas,
    input: InputController,
    collaboration: CollaborationManager,
}

impl Session {
    /// Create a session for a room with an empty canvas.
    pub fn new(room: RoomName) -> Self {
        Self::with_bindings(room, KeyBindings::default())
    }

    pub fn with_bindings(room: RoomName, bindings: KeyBindings) -> Self {
        Self {
            canvas: Canvas::new(),
            input: InputController::with_bindings(bindings),
            collaboration: CollaborationManager::new(room),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn room(&self) -> &RoomName {
        self.collaboration.room()
    }

    pub fn gestures(&self) -> GestureState {
        self.input.gestures()
    }

    pub fn bindings(&self) -> &KeyBindings {
        self.input.bindings()
    }

    pub fn collaboration(&self) -> &CollaborationManager {
        &self.collaboration
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.canvas.set_viewport_size(width, height);
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> InputResponse {
        let response = self.input.handle_pointer_event(&mut self.canvas, event);
        self.after_input(response)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> InputResponse {
        let response = self.input.handle_key_event(&mut self.canvas, event);
        self.after_input(response)
    }

    fn after_input(&mut self, response: InputResponse) -> InputResponse {
        if response.broadcast {
            self.collaboration.broadcast_history(self.canvas.document.history());
        }
        response
    }

    /// Apply one transport event.
    pub fn handle_sync_event(&mut self, event: SyncEvent) -> Redraw {
        match event {
            SyncEvent::Connected => {
                self.collaboration.on_connected();
                Redraw::None
            }
            SyncEvent::Disconnected => {
                self.collaboration.on_disconnected();
                Redraw::None
            }
            SyncEvent::Error { message } => {
                log::warn!("Transport error: {}", message);
                self.collaboration.on_disconnected();
                Redraw::None
            }
            SyncEvent::Message(json) => {
                match self.collaboration.handle_message(&json, &mut self.canvas.document) {
                    Some(_) => Redraw::Full,
                    None => Redraw::None,
                }
            }
        }
    }

    /// Poll the transport, apply what arrived and flush queued messages.
    ///
    /// Returns the combined redraw request. A message that fails to send is
    /// logged and lost.
    pub fn pump<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Redraw {
        let mut redraw = Redraw::None;
        for event in transport.poll_events() {
            redraw = redraw.merge(self.handle_sync_event(event));
        }

        for msg in self.collaboration.take_outgoing() {
            if let Err(e) = transport.send(&msg) {
                log::warn!("Failed to send message: {}", e);
            }
        }

        redraw
    }
}
