//! Watch-party server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-server
//! cargo run --bin tandem-server -- --host 0.0.0.0 --port 3001 --drop-empty-rooms
//! ```

use std::sync::Arc;

use clap::Parser;
use tandem_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, RoomPolicy},
    },
    ui::{AppState, Server},
};
use tandem_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tandem-server")]
#[command(about = "Watch-party server: shared playlists, playback sync and call signaling", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TANDEM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TANDEM_PORT", default_value = "3001")]
    port: u16,

    /// Remove a room from memory once its last member leaves
    #[arg(long, env = "TANDEM_DROP_EMPTY_ROOMS")]
    drop_empty_rooms: bool,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // 1. Repository
    let policy = RoomPolicy {
        retain_empty_rooms: !args.drop_empty_rooms,
    };
    let repository = Arc::new(InMemoryRoomRepository::new(policy));
    tracing::info!(
        "Empty rooms are {}",
        if repository.policy().retain_empty_rooms {
            "retained"
        } else {
            "dropped"
        }
    );

    // 2. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 3. UseCases and server
    let state = AppState::new(repository, message_pusher, Arc::new(SystemClock));
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
