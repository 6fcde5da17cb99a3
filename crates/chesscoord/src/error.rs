//! Unified error type for the coordinator binary.

use chesscoord_archive::ArchiveError;
use chesscoord_protocol::ProtocolError;
use chesscoord_session::SessionError;
use chesscoord_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers deal with this single type instead of importing errors from
/// each sub-crate; the `#[from]` attribute on each variant auto-generates
/// a `From` impl, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("configuration error: {0}")]
    Config(String),
}
