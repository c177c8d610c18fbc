//! Text formatting of room state for the terminal frontend.

use std::collections::BTreeMap;

use crate::{
    notice::Notice,
    projector::StoneAnimation,
    snapshot::{Snapshot, StoneId},
};

const RULE: &str = "============================================================";

/// Formatter for terminal display
pub struct BoardFormatter;

impl BoardFormatter {
    /// Format a snapshot as a board summary.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The room to show
    /// * `me` - The local player's name (marked as "me")
    pub fn format_snapshot(snapshot: &Snapshot, me: &str) -> String {
        let names = snapshot.player_names();
        let mut output = String::new();

        output.push_str(&format!("\n\n{RULE}\n"));
        output.push_str(&format!("Room {}", snapshot.code));
        if snapshot.sp_mode {
            output.push_str(" (hotseat)");
        }
        output.push('\n');

        let players: Vec<String> = names
            .iter()
            .map(|name| {
                if name == me {
                    format!("{name} (me)")
                } else {
                    name.clone()
                }
            })
            .collect();
        output.push_str(&format!("Players: {}\n", players.join(", ")));

        if snapshot.board.finished {
            output.push_str("The game has ended\n");
        } else {
            let current = names
                .get(snapshot.board.current_player)
                .map_or("?", String::as_str);
            output.push_str(&format!("Current player: {current}"));
            if snapshot.board.rounds_repeated > 0 {
                output.push_str(&format!(
                    " (repeated {} times)",
                    snapshot.board.rounds_repeated
                ));
            }
            output.push('\n');
        }

        for (index, hole) in snapshot.board.holes.iter().enumerate() {
            let owner = names
                .get(hole.player)
                .cloned()
                .unwrap_or_else(|| format!("Player {}", hole.player + 1));
            let kind = if hole.winhole { "store" } else { "hole " };
            output.push_str(&format!(
                "  [{index:>2}] {kind} {owner:<12} {:>2} {}\n",
                hole.stones.len(),
                "o".repeat(hole.stones.len())
            ));
        }

        if let Some(last) = snapshot.history.last() {
            output.push_str(&format!("Last: {last}\n"));
        }
        output.push_str(&format!("{RULE}\n"));
        output
    }

    /// Format a transient notice
    pub fn format_notice(notice: &Notice) -> String {
        format!("\n! {notice}\n")
    }

    /// Format the animation records, one stone per line
    pub fn format_stones(stones: &BTreeMap<StoneId, StoneAnimation>, rest_epsilon_sq: f64) -> String {
        if stones.is_empty() {
            return "\n(No stones)\n".to_string();
        }

        let mut output = String::from("\n");
        for (stone, record) in stones {
            let state = if record.is_at_rest(rest_epsilon_sq) {
                "resting"
            } else {
                "moving"
            };
            output.push_str(&format!(
                "stone {stone:>3} hole {:>2} at ({:>6.1}, {:>6.1}) -> ({:>6.1}, {:>6.1}) {state}\n",
                record.hole, record.current.x, record.current.y, record.target.x, record.target.y
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::Point,
        snapshot::fixtures::{hole, snapshot},
    };

    #[test]
    fn test_format_snapshot_lists_holes_and_players() {
        // テスト項目: 盤面の要約に穴ごとの石の数とプレイヤー一覧が含まれる
        // given (前提条件):
        let mut store = hole(3.0, 0.0, 1, &[5]);
        store.winhole = true;
        let snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[1, 2, 3]), store]);

        // when (操作):
        let formatted = BoardFormatter::format_snapshot(&snapshot, "alice");

        // then (期待する結果):
        assert!(formatted.contains("Room abc123"));
        assert!(formatted.contains("Players: alice (me), Player 2"));
        assert!(formatted.contains("Current player: alice"));
        assert!(formatted.contains("[ 0] hole  alice         3 ooo"));
        assert!(formatted.contains("[ 1] store Player 2      1 o"));
        assert!(formatted.contains("Last: Game started"));
    }

    #[test]
    fn test_format_snapshot_when_finished() {
        // テスト項目: 終了したゲームでは終了表示になる
        // given (前提条件):
        let mut snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[])]);
        snapshot.board.finished = true;

        // when (操作):
        let formatted = BoardFormatter::format_snapshot(&snapshot, "bob");

        // then (期待する結果):
        assert!(formatted.contains("The game has ended"));
        assert!(!formatted.contains("Current player"));
    }

    #[test]
    fn test_format_stones_marks_moving_stones() {
        // テスト項目: 移動中の石と静止している石が区別される
        // given (前提条件):
        let mut stones = BTreeMap::new();
        stones.insert(
            1,
            StoneAnimation {
                current: Point::new(0.0, 0.0),
                target: Point::new(0.0, 0.0),
                hole: 0,
            },
        );
        stones.insert(
            2,
            StoneAnimation {
                current: Point::new(0.0, 0.0),
                target: Point::new(50.0, 0.0),
                hole: 1,
            },
        );

        // when (操作):
        let formatted = BoardFormatter::format_stones(&stones, 0.05);

        // then (期待する結果):
        let lines: Vec<&str> = formatted.lines().filter(|line| !line.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("stone   1") && lines[0].ends_with("resting"));
        assert!(lines[1].starts_with("stone   2") && lines[1].ends_with("moving"));
    }

    #[test]
    fn test_format_stones_empty() {
        // テスト項目: 石がない場合はその旨が表示される
        // given (前提条件):
        let stones = BTreeMap::new();

        // when (操作):
        let formatted = BoardFormatter::format_stones(&stones, 0.05);

        // then (期待する結果):
        assert_eq!(formatted, "\n(No stones)\n");
    }
}
