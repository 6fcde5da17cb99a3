//! Invite options — input-only data consumed once at game creation.
//!
//! The invite matchmaking bookkeeping itself (listing, cancelling,
//! accepting) lives outside the core (§1 Out of scope); this crate only
//! carries the shape the core needs at the moment of acceptance.

use crate::identity::PlayerHandle;
use serde::{Deserialize, Serialize};

/// `Public` games are listed in the lobby; `Private` are reachable only by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Publicity {
    Public,
    Private,
}

/// The owner's preference for which seat they take. `Random` is resolved
/// with a fair coin at game-creation time (§4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    White,
    Black,
    Random,
}

/// Consumed exactly once by `create_game_from_invite`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteOptions {
    pub variant: String,
    pub time_control: String,
    pub color_preference: ColorPreference,
    pub rated: bool,
    pub publicity: Publicity,
    pub owner_handle: PlayerHandle,
    /// Variant metadata's sole externally-driven exception to "White moves
    /// first" (§4.1.1). Defaults to `false` for every variant that doesn't
    /// declare otherwise.
    pub black_starts: bool,
}
