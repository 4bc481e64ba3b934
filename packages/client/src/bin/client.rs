//! Headless watch-party client.
//!
//! Joins a room, keeps a simulated player in sync with it and takes commands or chat
//! from stdin. Reconnects automatically with exponential backoff (up to 5 retries).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-client -- --room movie-night --username alice
//! cargo run --bin tandem-client -- -r movie-night -n bob --tolerance 1.5
//! ```

use clap::Parser;

use tandem_client::{ClientConfig, run_client};
use tandem_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tandem-client")]
#[command(about = "Watch-party client with playback sync, chat and call signaling", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3001/ws")]
    url: String,

    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Display name
    #[arg(short = 'n', long)]
    username: String,

    /// Seconds of drift tolerated before a play/pause correction seeks
    #[arg(long, default_value_t = 2.0)]
    tolerance: f64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ClientConfig::new(args.url, args.room, args.username).with_tolerance(args.tolerance);

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
