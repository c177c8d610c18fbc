//! Client execution: enter a room, then run the session with a line editor.

use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use hollows_shared::time::SystemClock;

use crate::{
    api::{GameApi, HttpGameApi, JoinRequest, create_and_join},
    command::{HELP, Input, parse_command},
    error::ClientError,
    push::WsPushConnector,
    session::{Session, SessionCommand, SessionConfig},
    sync::RoomTarget,
    ui::TerminalRenderer,
};

/// How to get into a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEntry {
    /// Join an existing room by code
    Join { code: String },
    /// Create a room of `size` seats and join it
    Create { size: usize, hotseat: bool },
}

/// Everything the client needs to start
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// HTTP address of the game server
    pub server: String,
    /// Local player's name
    pub name: String,
    pub entry: RoomEntry,
    pub config: SessionConfig,
}

/// Enter the room and run the session until the user quits.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let api = Arc::new(HttpGameApi::new(&options.server)?);
    let connector = Arc::new(WsPushConnector::new(&options.server)?);

    let (code, snapshot) = match options.entry {
        RoomEntry::Join { code } => {
            let snapshot = api
                .join_room(&JoinRequest {
                    code: code.clone(),
                    name: options.name.clone(),
                })
                .await?;
            (code, snapshot)
        }
        RoomEntry::Create { size, hotseat } => {
            create_and_join(api.as_ref(), size, hotseat, &options.name).await?
        }
    };
    tracing::info!("Joined room '{}' as '{}'", code, options.name);
    println!(
        "\nYou are '{}' in room '{}'. Type 'help' for commands, 'quit' to leave.\n",
        options.name, code
    );

    let renderer = TerminalRenderer::new(
        options.name.clone(),
        options.config.animation.rest_epsilon_sq,
    );
    let mut session = Session::new(
        RoomTarget {
            code,
            player: options.name.clone(),
        },
        api,
        connector,
        Arc::new(SystemClock),
        options.config,
        renderer,
    );
    session.apply_snapshot(Arc::new(snapshot));

    let (commands_tx, commands_rx) = mpsc::unbounded_channel::<SessionCommand>();
    let prompt_name = options.name;

    // rustyline is synchronous; it gets its own thread and feeds the session
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();

                    match parse_command(line) {
                        Ok(Input::Command(command)) => {
                            let quit = command == SessionCommand::Quit;
                            if commands_tx.send(command).is_err() || quit {
                                break;
                            }
                        }
                        Ok(Input::Help) => println!("{HELP}"),
                        Err(message) => println!("{message}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    session.run(commands_rx).await;
    Ok(())
}
