//! Room snapshot model as delivered by the game server.
//!
//! A [`Snapshot`] is the whole room at one instant. It is never mutated after
//! it has been decoded; every refresh yields a fresh value that is shared
//! read-only (`Arc<Snapshot>`) with the projector and the renderer.

use serde::{Deserialize, Deserializer, Serialize};

/// Stable token identifying one physical stone for the whole game.
pub type StoneId = u32;

/// Full room state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub code: String,
    pub board: Board,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub players: Vec<Player>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub history: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<Rule>,
    /// Single-player ("hotseat") room
    #[serde(default)]
    pub sp_mode: bool,
}

/// Board part of the room state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub holes: Vec<Hole>,
    #[serde(default)]
    pub num_players: usize,
    #[serde(default)]
    pub current_player: usize,
    #[serde(default)]
    pub rounds_repeated: u32,
    #[serde(default)]
    pub finished: bool,
}

/// One board position holding zero or more stones.
///
/// Coordinates are in board units; see [`crate::layout::BoardLayout`] for the
/// mapping to screen units. The server may send the field names capitalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    #[serde(alias = "X")]
    pub x: f64,
    #[serde(alias = "Y")]
    pub y: f64,
    #[serde(default = "no_opposing_hole", alias = "OpposingHoleIdx")]
    pub opposing_hole_idx: i64,
    #[serde(default, alias = "Player")]
    pub player: usize,
    #[serde(default, alias = "Winhole")]
    pub winhole: bool,
    #[serde(default, alias = "Stones", deserialize_with = "null_as_empty")]
    pub stones: Vec<StoneId>,
}

fn no_opposing_hole() -> i64 {
    -1
}

/// The server encodes an unset list as `null`; read it as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A player seated in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
}

/// Game event a rule reacts to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleEvent {
    pub owngoal: i64,
    pub eaten: i64,
    pub repeat: i64,
    pub end_of_round: i64,
    pub index: i64,
    /// 1 won, 2 tied, negative lost
    pub victory: i64,
    pub player: i64,
    #[serde(deserialize_with = "null_as_empty")]
    pub stones: Vec<StoneId>,
}

/// House rule attached to the room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub event: RuleEvent,
    pub trigger_on_opponent: bool,
    pub scale_with_num: bool,
    pub embed_value: bool,
    pub text: String,
    pub min: i64,
    pub max: i64,
}

impl Snapshot {
    /// Display names for every seat.
    ///
    /// Seats nobody has joined yet are called "Player N" (1-based).
    pub fn player_names(&self) -> Vec<String> {
        (0..self.board.num_players)
            .map(|idx| match self.players.get(idx) {
                Some(player) => player.name.clone(),
                None => format!("Player {}", idx + 1),
            })
            .collect()
    }

    /// Display name of the player whose turn it is.
    pub fn current_player_name(&self) -> Option<String> {
        self.player_names().into_iter().nth(self.board.current_player)
    }

    /// Seat index of the player called `name`, if they joined.
    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|player| player.name == name)
    }

    /// Whose turn `me` could ask to hurry up.
    ///
    /// `None` when the game is over or when it is `me`'s own turn.
    pub fn ping_target(&self, me: &str) -> Option<String> {
        if self.board.finished {
            return None;
        }
        if self.seat_of(me) == Some(self.board.current_player) {
            return None;
        }
        self.current_player_name()
    }

    /// Iterate over `(hole index, stone)` pairs in board order.
    pub fn stone_assignments(&self) -> impl Iterator<Item = (usize, StoneId)> + '_ {
        self.board
            .holes
            .iter()
            .enumerate()
            .flat_map(|(idx, hole)| hole.stones.iter().map(move |&stone| (idx, stone)))
    }

    /// Total number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.board.holes.iter().map(|hole| hole.stones.len()).sum()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{hole, snapshot};
    use super::*;

    /// A freshly created two-seat room exactly as the server encodes it.
    ///
    /// Rule events carry `"stones":null` and no `repeat` key.
    const NEW_ROOM_JSON: &str = concat!(
        r#"{"code":"Xy12ab","players":[],"board":{"holes":["#,
        r#"{"X":-3.5,"Y":-1,"OpposingHoleIdx":-1,"Player":0,"Winhole":true,"Stones":[]},"#,
        r#"{"X":-2.5,"Y":-1,"OpposingHoleIdx":13,"Player":0,"Winhole":false,"Stones":[]},"#,
        r#"{"X":-1.5,"Y":-1,"OpposingHoleIdx":12,"Player":0,"Winhole":false,"Stones":[]},"#,
        r#"{"X":-0.5,"Y":-1,"OpposingHoleIdx":11,"Player":0,"Winhole":false,"Stones":[]},"#,
        r#"{"X":0.5,"Y":-1,"OpposingHoleIdx":10,"Player":0,"Winhole":false,"Stones":[]},"#,
        r#"{"X":1.5,"Y":-1,"OpposingHoleIdx":9,"Player":0,"Winhole":false,"Stones":[]},"#,
        r#"{"X":2.5,"Y":-1,"OpposingHoleIdx":8,"Player":0,"Winhole":false,"Stones":[]},"#,
        r#"{"X":3.5,"Y":-1,"OpposingHoleIdx":7,"Player":1,"Winhole":false,"Stones":[]},"#,
        r#"{"X":2.5,"Y":-1,"OpposingHoleIdx":6,"Player":1,"Winhole":false,"Stones":[]},"#,
        r#"{"X":1.5,"Y":-1,"OpposingHoleIdx":5,"Player":1,"Winhole":false,"Stones":[]},"#,
        r#"{"X":0.5,"Y":-1,"OpposingHoleIdx":4,"Player":1,"Winhole":false,"Stones":[]},"#,
        r#"{"X":-0.5,"Y":-1,"OpposingHoleIdx":3,"Player":1,"Winhole":false,"Stones":[]},"#,
        r#"{"X":-1.5,"Y":-1,"OpposingHoleIdx":2,"Player":1,"Winhole":false,"Stones":[]},"#,
        r#"{"X":3.5,"Y":1,"OpposingHoleIdx":-1,"Player":1,"Winhole":true,"Stones":[]}"#,
        r#"],"num_players":2,"current_player":1,"rounds_repeated":0,"finished":false},"#,
        r#""history":[],"rules":["#,
        r#"{"event":{"owngoal":0,"eaten":1,"end_of_round":1,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":true,"scale_with_num":false,"embed_value":false,"text":"give a level 6 confession","min":0,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":1,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":true,"scale_with_num":true,"embed_value":false,"text":"take a drink!","min":0,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":0,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":true,"scale_with_num":true,"embed_value":false,"text":"take a drink!","min":0,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":0,"end_of_round":1,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":true,"scale_with_num":true,"embed_value":false,"text":"take a drink!","min":0,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":0,"end_of_round":1,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":true,"scale_with_num":true,"embed_value":false,"text":"take a drink!","min":0,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":0,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":false,"scale_with_num":false,"embed_value":false,"text":"best/worst category","min":0,"max":1},"#,
        r#"{"event":{"owngoal":1,"eaten":0,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":false,"scale_with_num":false,"embed_value":false,"text":"give a dice roll confession","min":0,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":1,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":false,"scale_with_num":false,"embed_value":false,"text":"say a nice thing","min":1,"max":1},"#,
        r#"{"event":{"owngoal":0,"eaten":1,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":false,"scale_with_num":false,"embed_value":false,"text":"say a mean thing","min":2,"max":2},"#,
        r#"{"event":{"owngoal":0,"eaten":1,"end_of_round":0,"index":0,"victory":0,"player":0,"stones":null},"trigger_on_opponent":false,"scale_with_num":false,"embed_value":false,"text":"ask a dice roll truth","min":3,"max":0},"#,
        r#"{"event":{"owngoal":0,"eaten":0,"end_of_round":0,"index":0,"victory":1,"player":0,"stones":null},"trigger_on_opponent":false,"scale_with_num":true,"embed_value":true,"text":"give a level %s confession","min":0,"max":-1}"#,
        r#"]}"#,
    );

    #[test]
    fn test_decode_room_json_from_server() {
        // テスト項目: サーバーの Room JSON がスナップショットにデコードされる
        // given (前提条件):
        let json = r#"{
            "code": "Xy12ab",
            "players": [{"name": "alice"}, {"name": "bob"}],
            "board": {
                "holes": [
                    {"X": -1.5, "Y": 0.5, "OpposingHoleIdx": 3, "Player": 0, "Winhole": false, "Stones": [1, 2]},
                    {"x": 2.0, "y": 0.0, "player": 1, "winhole": true, "stones": []}
                ],
                "num_players": 2,
                "current_player": 1,
                "rounds_repeated": 0,
                "finished": false
            },
            "history": ["alice played hole 0"],
            "rules": [{"event": {"owngoal": 1}, "text": "drink", "min": 1, "max": 3}]
        }"#;

        // when (操作):
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.code, "Xy12ab");
        assert_eq!(snapshot.board.holes.len(), 2);
        assert_eq!(snapshot.board.holes[0].x, -1.5);
        assert_eq!(snapshot.board.holes[0].opposing_hole_idx, 3);
        assert_eq!(snapshot.board.holes[0].stones, vec![1, 2]);
        assert_eq!(snapshot.board.holes[1].opposing_hole_idx, -1);
        assert!(snapshot.board.holes[1].winhole);
        assert_eq!(snapshot.rules[0].event.owngoal, 1);
        assert_eq!(snapshot.rules[0].text, "drink");
        assert!(!snapshot.sp_mode);
    }

    #[test]
    fn test_decode_new_room_as_the_server_sends_it() {
        // テスト項目: 作成直後の部屋 JSON (null のリストを含む) がデコードできる
        // given (前提条件):
        let json = NEW_ROOM_JSON;

        // when (操作):
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.code, "Xy12ab");
        assert_eq!(snapshot.board.holes.len(), 14);
        assert_eq!(snapshot.board.holes[1].opposing_hole_idx, 13);
        assert!(snapshot.board.holes[13].winhole);
        assert_eq!(snapshot.stone_count(), 0);
        assert_eq!(snapshot.rules.len(), 11);
        assert!(snapshot.rules.iter().all(|rule| rule.event.stones.is_empty()));
        assert_eq!(snapshot.rules[5].event.repeat, 0);
        assert_eq!(snapshot.rules[10].text, "give a level %s confession");
        assert_eq!(snapshot.player_names(), vec!["Player 1", "Player 2"]);
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        // テスト項目: null で送られたリストは空として扱われる
        // given (前提条件):
        let json = r#"{
            "code": "Xy12ab",
            "players": null,
            "board": {
                "holes": [{"X": 0, "Y": 0, "Player": 0, "Winhole": false, "Stones": null}],
                "num_players": 2
            },
            "history": null,
            "rules": null
        }"#;

        // when (操作):
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(snapshot.players.is_empty());
        assert!(snapshot.history.is_empty());
        assert!(snapshot.rules.is_empty());
        assert!(snapshot.board.holes[0].stones.is_empty());
    }

    #[test]
    fn test_player_names_fill_empty_seats() {
        // テスト項目: 未参加の席は "Player N" として表示される
        // given (前提条件):
        let snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[])]);

        // when (操作):
        let names = snapshot.player_names();

        // then (期待する結果):
        assert_eq!(names, vec!["alice".to_string(), "Player 2".to_string()]);
    }

    #[test]
    fn test_ping_target_is_current_player_for_others() {
        // テスト項目: 自分の手番でなければ現在の手番のプレイヤーを催促できる
        // given (前提条件):
        let mut snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[])]);
        snapshot.board.current_player = 1;

        // when (操作):
        let target = snapshot.ping_target("alice");

        // then (期待する結果):
        assert_eq!(target, Some("Player 2".to_string()));
    }

    #[test]
    fn test_ping_target_none_on_own_turn() {
        // テスト項目: 自分の手番では催促する相手がいない
        // given (前提条件):
        let snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[])]);

        // when (操作):
        let target = snapshot.ping_target("alice");

        // then (期待する結果):
        assert_eq!(target, None);
    }

    #[test]
    fn test_ping_target_none_when_finished() {
        // テスト項目: ゲーム終了後は催促できない
        // given (前提条件):
        let mut snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[])]);
        snapshot.board.current_player = 1;
        snapshot.board.finished = true;

        // when (操作):
        let target = snapshot.ping_target("alice");

        // then (期待する結果):
        assert_eq!(target, None);
    }

    #[test]
    fn test_stone_assignments_in_board_order() {
        // テスト項目: 石と穴の対応が盤面順に列挙される
        // given (前提条件):
        let snapshot = snapshot(vec![hole(0.0, 0.0, 0, &[4, 5]), hole(1.0, 0.0, 1, &[9])]);

        // when (操作):
        let assignments: Vec<_> = snapshot.stone_assignments().collect();

        // then (期待する結果):
        assert_eq!(assignments, vec![(0, 4), (0, 5), (1, 9)]);
        assert_eq!(snapshot.stone_count(), 3);
    }
}
