//! The data this crate needs to archive one completed game. Built by the
//! caller (the game actor, at deletion time) from its in-memory record;
//! kept separate from `chesscoord-session`'s own `GameRecord` so this
//! crate has no dependency on it.

use chesscoord_notation::{GameHeader, Move};
use chesscoord_protocol::Publicity;
use chrono::{DateTime, Utc};

/// The outcome recorded in the `Result` tag (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    /// Covers `Aborted` and any conclusion that is neither a win nor a draw.
    Aborted,
}

impl GameResult {
    pub fn as_tag(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Aborted => "0-0",
        }
    }
}

/// Everything `archive()` needs for one game. `header` carries the
/// position and move-rule state the transcript is built from; its
/// `tags` field is ignored — `archive()` builds the tag block itself
/// from the other fields here.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub game_id: String,
    pub white_display_name: String,
    pub black_display_name: String,
    pub publicity: Publicity,
    pub variant: String,
    pub time_control: String,
    pub rated: bool,
    pub final_clock_white_ms: u64,
    pub final_clock_black_ms: u64,
    pub header: GameHeader,
    pub moves: Vec<Move>,
    /// §7 item 5: set when the in-memory move list could not be
    /// re-parsed into [`Move`]s at archival time. The transcript is then
    /// written as the literal sentinel `ICN UNAVAILABLE` instead of the
    /// encoded move list; `moves` is left empty in that case.
    pub transcript_unavailable: bool,
    pub result: GameResult,
    pub termination: String,
    pub recorded_at: DateTime<Utc>,
}

impl GameSummary {
    pub fn move_count(&self) -> u64 {
        self.moves.len() as u64
    }
}
