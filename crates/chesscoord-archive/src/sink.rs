//! The archival sink (§4.4): appends a structured summary line and a
//! compact-notation transcript to an append-only log file whenever a
//! game with at least one move is deleted.

use std::path::{Path, PathBuf};

use chesscoord_notation::record::{self, GameRecord};
use chesscoord_notation::GameHeader;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ArchiveError;
use crate::stats::StatsStore;
use crate::summary::GameSummary;

/// Owns the archive log path and the stats file it updates alongside it.
/// §5: the log file is append-only and guarded by an in-process lock so
/// two games concluding at once queue their writes instead of
/// interleaving them, same as [`StatsStore`]'s own lock.
pub struct ArchiveSink {
    log_path: PathBuf,
    lock: Mutex<()>,
    stats: StatsStore,
}

impl ArchiveSink {
    pub fn new(log_path: impl Into<PathBuf>, stats_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            lock: Mutex::new(()),
            stats: StatsStore::new(stats_path),
        }
    }

    /// Archives one completed game (§4.4). Does nothing if the move list
    /// is empty. The log write is propagated to the caller, which logs
    /// and discards it — the game is removed either way. The stats
    /// update is always best-effort: a failure there is logged here and
    /// never surfaced, since the archive line itself already landed.
    pub async fn archive(&self, summary: &GameSummary) -> Result<(), ArchiveError> {
        if summary.moves.is_empty() && !summary.transcript_unavailable {
            return Ok(());
        }

        let line = players_line(summary);
        let transcript = if summary.transcript_unavailable {
            "ICN UNAVAILABLE".to_string()
        } else {
            record::encode(&build_record(summary), true)?
        };

        {
            let _guard = self.lock.lock().await;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .await
                .map_err(ArchiveError::LogWrite)?;
            file.write_all(format!("{line}\n{transcript}\n\n").as_bytes())
                .await
                .map_err(ArchiveError::LogWrite)?;
        }

        if let Err(e) = self
            .stats
            .record_game(&summary.variant, summary.move_count(), summary.recorded_at)
            .await
        {
            warn!(error = %e, game_id = %summary.game_id, "stats file update failed");
        }

        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

fn players_line(summary: &GameSummary) -> String {
    format!(
        "Players: White={} Black={} Game={{id={}, publicity={:?}, clocks=[{}, {}]}}",
        summary.white_display_name,
        summary.black_display_name,
        summary.game_id,
        summary.publicity,
        summary.final_clock_white_ms,
        summary.final_clock_black_ms,
    )
}

fn build_record(summary: &GameSummary) -> GameRecord {
    let event = if summary.rated { "Rated Game" } else { "Casual Game" };
    let tags = vec![
        ("Event".to_string(), event.to_string()),
        ("Site".to_string(), "-".to_string()),
        ("Round".to_string(), "-".to_string()),
        ("Variant".to_string(), summary.variant.clone()),
        ("White".to_string(), summary.white_display_name.clone()),
        ("Black".to_string(), summary.black_display_name.clone()),
        ("TimeControl".to_string(), summary.time_control.clone()),
        (
            "UTCDate".to_string(),
            summary.recorded_at.format("%Y.%m.%d").to_string(),
        ),
        (
            "UTCTime".to_string(),
            summary.recorded_at.format("%H:%M:%S").to_string(),
        ),
        ("Result".to_string(), summary.result.as_tag().to_string()),
        ("Termination".to_string(), summary.termination.clone()),
    ];
    let header = GameHeader {
        tags,
        ..summary.header.clone()
    };
    GameRecord {
        header,
        moves: summary.moves.clone(),
    }
}
