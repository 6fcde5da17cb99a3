//! The archival sink (§4.4) and the stats file (§6). Both are
//! off-the-hot-path persistence: a completed game is archived once, at
//! deletion, and the stats file is nudged alongside it, best-effort.

mod error;
mod sink;
mod stats;
mod summary;

pub use error::ArchiveError;
pub use sink::ArchiveSink;
pub use stats::{GamesPlayed, Stats, StatsStore};
pub use summary::{GameResult, GameSummary};
