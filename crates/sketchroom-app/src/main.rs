//! Main application entry point (native).

use clap::Parser;
use sketchroom_app::{App, AppConfig, DEFAULT_SERVER_URL, prompt_room};
use sketchroom_core::room::RoomName;

#[derive(Parser, Debug)]
#[command(name = "sketchroom", version, about = "Draw together in a shared room")]
struct Cli {
    /// Relay server WebSocket URL
    #[arg(long, env = "SKETCHROOM_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Room to join (asked for interactively when missing)
    #[arg(long, env = "SKETCHROOM_ROOM")]
    room: Option<String>,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 800)]
    height: u32,
}

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let room = match cli.room.as_deref().map(RoomName::parse) {
        Some(Ok(room)) => Some(room),
        Some(Err(e)) => {
            eprintln!("--room: {}", e);
            prompt()
        }
        None => prompt(),
    };
    let Some(room) = room else {
        eprintln!("No room name given");
        std::process::exit(2);
    };

    log::info!("Starting SketchRoom");
    let config = AppConfig {
        width: cli.width,
        height: cli.height,
        server_url: cli.server,
        ..AppConfig::new(room)
    };

    if let Err(e) = App::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "native")]
fn prompt() -> Option<RoomName> {
    let stdin = std::io::stdin();
    match prompt_room(stdin.lock(), std::io::stdout()) {
        Ok(room) => room,
        Err(e) => {
            eprintln!("Failed to read room name: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
