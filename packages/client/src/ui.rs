//! Terminal frontend: prints what the session renders.

use std::io::Write;

use hollows_shared::time::timestamp_to_rfc3339;

use crate::{
    formatter::BoardFormatter,
    notice::Notice,
    session::{FrameView, Renderer},
    snapshot::Snapshot,
};

/// Redisplay the prompt after printing something
pub fn redisplay_prompt(player: &str) {
    print!("{}> ", player);
    std::io::stdout().flush().ok();
}

/// Renderer printing board summaries and notices to stdout.
///
/// Stone motion is not drawn; `stones` shows the animation records instead.
pub struct TerminalRenderer {
    player: String,
    rest_epsilon_sq: f64,
}

impl TerminalRenderer {
    pub fn new(player: String, rest_epsilon_sq: f64) -> Self {
        Self {
            player,
            rest_epsilon_sq,
        }
    }
}

impl Renderer for TerminalRenderer {
    fn snapshot_changed(&mut self, snapshot: &Snapshot) {
        print!("{}", BoardFormatter::format_snapshot(snapshot, &self.player));
        redisplay_prompt(&self.player);
    }

    fn notice(&mut self, notice: &Notice) {
        print!("{}", BoardFormatter::format_notice(notice));
        redisplay_prompt(&self.player);
    }

    fn show_stones(&mut self, view: FrameView<'_>) {
        if let Some(at) = timestamp_to_rfc3339(view.last_update_at) {
            print!("\nLast heard from the server at {}", at);
        }
        print!(
            "{}",
            BoardFormatter::format_stones(view.stones, self.rest_epsilon_sq)
        );
        redisplay_prompt(&self.player);
    }
}
