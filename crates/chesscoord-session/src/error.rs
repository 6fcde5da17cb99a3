//! The error taxonomy from §7. None of these propagate past the
//! handler boundary — [`crate::actor::GameActor`] catches every one of
//! them and turns it into a log line plus, where the taxonomy calls for
//! it, an outbound notice.

use crate::id::GameId;
use chesscoord_protocol::PlayerHandle;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// §7.4 "game not found" (resync, or a stale subscription).
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// Invite acceptance found the player already seated elsewhere.
    #[error("player {0} is already in an active game")]
    AlreadyInGame(PlayerHandle),

    /// §7.1: wrong move number, invalid move format, implausible
    /// conclusion, resign of a finished game, self-report, and so on.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// §4.1.2 precondition 4: `moveNumber` didn't match. Distinct from
    /// [`SessionError::ProtocolViolation`] because the caller must
    /// additionally trigger a resync for the offending endpoint.
    #[error("move number mismatch, resync required")]
    MoveNumberMismatch,

    /// §7.2: abort after opponent aborted, accept of a non-existent
    /// offer, AFK while a disconnect timer is already active.
    #[error("stale action: {0}")]
    StaleAction(String),

    /// The game actor's command channel is full or closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),

    #[error("archive failed: {0}")]
    Archive(#[from] chesscoord_archive::ArchiveError),

    #[error("notation error: {0}")]
    Notation(#[from] chesscoord_notation::NotationError),

    #[error("transport error: {0}")]
    Transport(#[from] chesscoord_transport::TransportError),
}
