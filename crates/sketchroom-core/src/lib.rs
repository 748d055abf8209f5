//! SketchRoom Core Library
//!
//! Platform-agnostic data structures and logic for the SketchRoom shared
//! drawing surface: strokes and history, pan/zoom, input handling and room
//! synchronization.

pub mod camera;
pub mod canvas;
pub mod collaboration;
pub mod input;
pub mod room;
pub mod session;
pub mod stroke;
pub mod sync;

pub use camera::Camera;
pub use canvas::{Canvas, CanvasDocument};
pub use collaboration::{CollaborationManager, RemoteUpdate};
pub use input::{
    GestureState, InputController, InputResponse, KeyBindings, KeyEvent, Modifiers, MouseButton,
    PointerEvent, Redraw, Shortcut,
};
pub use room::{RoomName, RoomNameError};
pub use session::Session;
pub use stroke::{History, Segment, Stroke, StrokeError};
#[cfg(not(target_arch = "wasm32"))]
pub use sync::NativeWebSocket;
pub use sync::{ClientMessage, ConnectionState, ServerMessage, SyncError, SyncEvent, Transport};
