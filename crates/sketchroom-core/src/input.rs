//! Pointer/keyboard input and the local input controller.
//!
//! The controller turns raw device events into stroke building, panning,
//! zooming and undo/redo on a [`Canvas`], and reports what has to be redrawn
//! and whether the room needs a fresh history snapshot.

use crate::canvas::Canvas;
use crate::stroke::Segment;
use kurbo::{Line, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button: draws.
    Left,
    /// Secondary button: pans.
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event in device coordinates (1:1 with screen coordinates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Wheel event. `delta.y` follows the DOM convention: positive when
    /// scrolling down (away from the user), which zooms out.
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Keyboard event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed { key: String, modifiers: Modifiers },
    Released { key: String },
}

/// A keyboard chord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: String,
    /// Ctrl, or the platform command (Meta) key.
    pub ctrl: bool,
    pub shift: bool,
}

impl Shortcut {
    pub fn new(key: impl Into<String>, ctrl: bool, shift: bool) -> Self {
        Self {
            key: key.into(),
            ctrl,
            shift,
        }
    }

    /// Check whether a key press triggers this chord. Letter case is ignored.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == (modifiers.ctrl || modifiers.meta)
            && self.shift == modifiers.shift
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(self.key.to_uppercase());
        parts.join("+")
    }
}

/// History actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Undo,
    Redo,
}

/// Undo/redo chord bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub undo: Vec<Shortcut>,
    pub redo: Vec<Shortcut>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            undo: vec![Shortcut::new("z", true, false)],
            redo: vec![Shortcut::new("y", true, false), Shortcut::new("z", true, true)],
        }
    }
}

impl KeyBindings {
    /// Human readable list of the bound chords, e.g. `Ctrl+Z undo, Ctrl+Y/Ctrl+Shift+Z redo`.
    pub fn summary(&self) -> String {
        let join = |chords: &[Shortcut]| chords.iter().map(Shortcut::format).collect::<Vec<_>>().join("/");
        format!("{} undo, {} redo", join(&self.undo), join(&self.redo))
    }

    /// Resolve a key press to an action.
    pub fn action_for(&self, key: &str, modifiers: Modifiers) -> Option<KeyAction> {
        if self.undo.iter().any(|s| s.matches(key, modifiers)) {
            Some(KeyAction::Undo)
        } else if self.redo.iter().any(|s| s.matches(key, modifiers)) {
            Some(KeyAction::Redo)
        } else {
            None
        }
    }
}

/// Active gestures.
///
/// The flags are independent on purpose: with two buttons held, a client can
/// draw and pan at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    pub drawing: bool,
    pub panning: bool,
}

/// What has to be repainted after an event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Redraw {
    #[default]
    None,
    /// Only the given screen-space segment is new.
    Segment(Line),
    /// Every committed stroke must be repainted.
    Full,
}

impl Redraw {
    /// Combine two requests; anything beyond a single segment becomes a full
    /// repaint.
    pub fn merge(self, other: Redraw) -> Redraw {
        match (self, other) {
            (Redraw::None, redraw) | (redraw, Redraw::None) => redraw,
            _ => Redraw::Full,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Redraw::None)
    }
}

/// Outcome of one input event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputResponse {
    pub redraw: Redraw,
    /// The history changed and must be broadcast to the room.
    pub broadcast: bool,
    /// The host must suppress its default handling of the key press.
    pub suppress_default: bool,
}

/// Interprets input events against a canvas.
#[derive(Debug, Clone, Default)]
pub struct InputController {
    gestures: GestureState,
    /// Last pointer position in screen coordinates.
    anchor: Point,
    bindings: KeyBindings,
}

impl InputController {
    /// Create a controller with the default key bindings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    pub fn gestures(&self) -> GestureState {
        self.gestures
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, canvas: &mut Canvas, event: PointerEvent) -> InputResponse {
        match event {
            PointerEvent::Down { position, button } => {
                match button {
                    MouseButton::Left => {
                        self.gestures.drawing = true;
                        canvas.document.begin_stroke();
                    }
                    MouseButton::Right => self.gestures.panning = true,
                    MouseButton::Middle => {}
                }
                self.anchor = position;
                InputResponse::default()
            }
            PointerEvent::Move { position } => {
                let previous = self.anchor;
                let mut response = InputResponse::default();

                if self.gestures.drawing {
                    let start = canvas.camera.to_true(previous);
                    let end = canvas.camera.to_true(position);
                    canvas.document.extend_stroke(Segment::new(start, end));
                    response.redraw = Redraw::Segment(Line::new(previous, position));
                }

                if self.gestures.panning {
                    canvas.camera.pan(position - previous);
                    response.redraw = Redraw::Full;
                }

                self.anchor = position;
                response
            }
            PointerEvent::Up { position, .. } => {
                let was_drawing = self.gestures.drawing;
                self.gestures = GestureState::default();
                self.anchor = position;

                if was_drawing && canvas.document.commit_stroke().is_some() {
                    InputResponse {
                        redraw: Redraw::Full,
                        broadcast: true,
                        suppress_default: false,
                    }
                } else {
                    InputResponse::default()
                }
            }
            PointerEvent::Scroll { position, delta } => {
                let viewport = canvas.viewport_size;
                canvas.camera.zoom_at(position, delta.y, viewport);
                InputResponse {
                    redraw: Redraw::Full,
                    ..InputResponse::default()
                }
            }
        }
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, canvas: &mut Canvas, event: &KeyEvent) -> InputResponse {
        let KeyEvent::Pressed { key, modifiers } = event else {
            return InputResponse::default();
        };
        let Some(action) = self.bindings.action_for(key, *modifiers) else {
            return InputResponse::default();
        };

        let changed = match action {
            KeyAction::Undo => canvas.document.undo(),
            KeyAction::Redo => canvas.document.redo(),
        };
        log::debug!("{action:?} (changed: {})", changed.is_some());

        InputResponse {
            redraw: if changed.is_some() { Redraw::Full } else { Redraw::None },
            broadcast: changed.is_some(),
            suppress_default: true,
        }
    }
}
