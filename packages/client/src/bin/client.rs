//! Terminal client for Hollows rooms.
//!
//! Joins (or creates) a room, keeps the board in sync through the server's
//! push channel with a 10 second staleness fallback, and reads commands from
//! stdin.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hollows-client -- --name Alice --create
//! cargo run --bin hollows-client -- -n Bob -r Xy12ab -s http://127.0.0.1:4000
//! ```

use clap::Parser;

use hollows_client::{
    run_client,
    runner::{ClientOptions, RoomEntry},
    session::SessionConfig,
};
use hollows_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hollows-client")]
#[command(about = "Terminal client for Hollows board game rooms", long_about = None)]
struct Args {
    /// Player name shown to the other players
    #[arg(short = 'n', long)]
    name: String,

    /// Code of the room to join
    #[arg(short = 'r', long, required_unless_present = "create", conflicts_with = "create")]
    room: Option<String>,

    /// Create a new room instead of joining one
    #[arg(long)]
    create: bool,

    /// Number of seats of a created room
    #[arg(long, default_value_t = 2, requires = "create")]
    size: usize,

    /// Let one person play every seat of a created room
    #[arg(long, requires = "create")]
    hotseat: bool,

    /// HTTP address of the game server
    #[arg(
        short = 's',
        long,
        env = "HOLLOWS_SERVER",
        default_value = "http://127.0.0.1:4000"
    )]
    server: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let entry = match args.room {
        Some(code) => RoomEntry::Join { code },
        None => RoomEntry::Create {
            size: args.size,
            hotseat: args.hotseat,
        },
    };
    let options = ClientOptions {
        server: args.server,
        name: args.name,
        entry,
        config: SessionConfig::default(),
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}
