//! SketchRoom Application
//!
//! The desktop shell: windowing, input translation, rendering and the room
//! connection.

mod app;
mod event_handler;
mod prompt;

pub use app::{App, AppConfig, AppError, DEFAULT_SERVER_URL};
pub use event_handler::EventHandler;
pub use prompt::prompt_room;
