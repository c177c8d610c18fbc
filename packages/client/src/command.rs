//! Parsing of the text frontend's commands.

use crate::{layout::Point, session::SessionCommand};

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  move <hole>     play the stones of hole <hole>
  click <x> <y>   release the pointer at screen position (x, y)
  ping            ask the current player to hurry up
  restart         start a new game once this one is over
  refresh         refetch the board now
  stones          show where every stone is drawn
  help            show this help
  quit            leave the room";

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(SessionCommand),
    Help,
}

/// Parse one input line.
///
/// Returns a user-facing message when the line is not a command.
pub fn parse_command(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("move" | "m", [hole]) => SessionCommand::Move(
            hole.parse()
                .map_err(|_| format!("'{hole}' is not a hole number"))?,
        ),
        ("click" | "c", [x, y]) => {
            let x: f64 = x.parse().map_err(|_| format!("'{x}' is not a number"))?;
            let y: f64 = y.parse().map_err(|_| format!("'{y}' is not a number"))?;
            SessionCommand::Click(Point::new(x, y))
        }
        ("ping", []) => SessionCommand::Ping,
        ("restart", []) => SessionCommand::Restart,
        ("refresh" | "r", []) => SessionCommand::Refresh,
        ("stones", []) => SessionCommand::ShowStones,
        ("quit" | "exit" | "q", []) => SessionCommand::Quit,
        ("help" | "?", []) => return Ok(Input::Help),
        ("move" | "m" | "click" | "c", _) => {
            return Err(format!("wrong arguments for '{verb}', try 'help'"));
        }
        _ => return Err(format!("unknown command '{verb}', try 'help'")),
    };
    Ok(Input::Command(command))
}
