//! Compact move/position notation — §4.3 of the coordinator's contract.
//!
//! Converts a completed game record to a compact transcript string and
//! back. Four layers, outside-in:
//!
//! - [`record`] — the full transcript: tag block, metadata line, moves.
//! - [`header`] — the `[Key: Value]` tags plus the single metadata line
//!   (turn, en passant, move-rule fraction, full-move counter, optional
//!   promotion-rank/win-condition declarations, an other-rules JSON
//!   blob, and the position).
//! - [`position`] — pipe-separated piece placements.
//! - [`moves`] — `<x,y>><x,y>[promotion]`, with a compact mode that
//!   drops the `=`/`x`/`+`/`#` annotations.
//! - [`pieces`] — the long-name ↔ token dictionary; case encodes color.
//!
//! Every layer here is pure — no I/O, no async. `chesscoord-archive`
//! calls into this crate to build the lines it appends to the archival
//! log.

pub mod error;
pub mod header;
pub mod moves;
pub mod pieces;
pub mod position;
pub mod record;

pub use error::NotationError;
pub use header::GameHeader;
pub use moves::Move;
pub use pieces::Side;
pub use position::{Coord, PlacedPiece, Position};
pub use record::GameRecord;
