//! Translation of winit window events into canvas input.

use kurbo::{Point, Vec2};
use sketchroom_core::input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
use winit::event::{ElementState, MouseButton as WinitButton, MouseScrollDelta};
use winit::keyboard::{Key, ModifiersState};

/// Pixels per wheel line, matching a browser's line-to-pixel conversion.
const PIXELS_PER_LINE: f64 = 100.0;

/// Tracks the cursor and modifier keys between window events, since winit
/// reports them separately from button and key presses.
#[derive(Debug, Clone, Default)]
pub struct EventHandler {
    cursor: Point,
    modifiers: Modifiers,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_moved(&mut self, position: Point) -> PointerEvent {
        self.cursor = position;
        PointerEvent::Move { position }
    }

    pub fn mouse_input(&self, state: ElementState, button: WinitButton) -> Option<PointerEvent> {
        let button = match button {
            WinitButton::Left => MouseButton::Left,
            WinitButton::Right => MouseButton::Right,
            WinitButton::Middle => MouseButton::Middle,
            _ => return None,
        };
        let position = self.cursor;
        Some(match state {
            ElementState::Pressed => PointerEvent::Down { position, button },
            ElementState::Released => PointerEvent::Up { position, button },
        })
    }

    /// Wheel input at the cursor.
    ///
    /// winit reports positive `y` when scrolling up; canvas input expects the
    /// browser convention of positive `y` scrolling down, so the sign flips.
    pub fn mouse_wheel(&self, delta: MouseScrollDelta) -> PointerEvent {
        let delta = match delta {
            MouseScrollDelta::LineDelta(x, y) => {
                Vec2::new(-x as f64 * PIXELS_PER_LINE, -y as f64 * PIXELS_PER_LINE)
            }
            MouseScrollDelta::PixelDelta(pos) => Vec2::new(-pos.x, -pos.y),
        };
        PointerEvent::Scroll {
            position: self.cursor,
            delta,
        }
    }

    pub fn modifiers_changed(&mut self, state: ModifiersState) {
        self.modifiers = Modifiers {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            meta: state.super_key(),
        };
    }

    /// Character keys only; named keys carry no canvas binding.
    pub fn keyboard_input(&self, logical_key: &Key, state: ElementState) -> Option<KeyEvent> {
        let Key::Character(text) = logical_key else {
            return None;
        };
        let key = text.to_string();
        Some(match state {
            ElementState::Pressed => KeyEvent::Pressed {
                key,
                modifiers: self.modifiers,
            },
            ElementState::Released => KeyEvent::Released { key },
        })
    }
}
