//! SketchRoom relay server binary.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sketchroom-server
//! cargo run --bin sketchroom-server -- --host 127.0.0.1 --port 4000
//! ```

use clap::Parser;
use sketchroom_server::{AppState, ServerConfig};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sketchroom-server")]
#[command(about = "WebSocket relay for SketchRoom drawing rooms", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3030")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchroom_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };

    let listener = match tokio::net::TcpListener::bind(config.addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.addr(), e);
            std::process::exit(1);
        }
    };
    info!("SketchRoom relay server listening on {}", config.addr());
    info!("WebSocket endpoint: ws://{}/ws", config.addr());

    if let Err(e) = sketchroom_server::serve(listener, Arc::new(AppState::new())).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
