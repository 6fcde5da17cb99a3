//! The stats JSON file (§6 "Persisted files"): a read-modify-write
//! document tracking games played and moves submitted, updated once per
//! successful archive call (SPEC_FULL supplement — not spelled out in
//! the §4 operation list). Guarded by an in-process lock rather than an
//! OS file lock: the coordinator is single-process (§5), so there is
//! never a second writer to race against.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::ArchiveError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GamesPlayed {
    #[serde(rename = "byDay")]
    pub by_day: HashMap<String, u64>,
    #[serde(rename = "byMonth")]
    pub by_month: HashMap<String, u64>,
    #[serde(rename = "allTime")]
    pub all_time: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    #[serde(rename = "gamesPlayed")]
    pub games_played: GamesPlayed,
    #[serde(rename = "moveCount")]
    pub move_count: HashMap<String, u64>,
}

pub struct StatsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Increments `gamesPlayed` for the day/month/all-time buckets and
    /// `moveCount` for `all`, `variant`, and the current `yyyy-mm`
    /// bucket by `move_count`.
    pub async fn record_game(
        &self,
        variant: &str,
        move_count: u64,
        at: DateTime<Utc>,
    ) -> Result<(), ArchiveError> {
        let _guard = self.lock.lock().await;

        let mut stats = self.read().await?;

        let day = at.format("%Y-%m-%d").to_string();
        let month = at.format("%Y-%m").to_string();
        *stats.games_played.by_day.entry(day).or_insert(0) += 1;
        *stats.games_played.by_month.entry(month.clone()).or_insert(0) += 1;
        stats.games_played.all_time += 1;

        *stats.move_count.entry("all".to_string()).or_insert(0) += move_count;
        *stats.move_count.entry(variant.to_string()).or_insert(0) += move_count;
        *stats.move_count.entry(month).or_insert(0) += move_count;

        self.write(&stats).await
    }

    async fn read(&self) -> Result<Stats, ArchiveError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Stats::default()),
            Err(e) => Err(ArchiveError::StatsIo(e)),
        }
    }

    async fn write(&self, stats: &Stats) -> Result<(), ArchiveError> {
        let body = serde_json::to_string_pretty(stats)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(ArchiveError::StatsIo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("chesscoord-stats-test-{}-{}.json", std::process::id(), n))
    }

    #[tokio::test]
    async fn test_record_game_creates_file_with_first_entry() {
        let path = temp_path();
        let store = StatsStore::new(&path);
        let at = Utc.with_ymd_and_hms(2026, 7, 28, 9, 30, 0).unwrap();

        store.record_game("Standard", 12, at).await.unwrap();

        let stats = store.read().await.unwrap();
        assert_eq!(stats.games_played.all_time, 1);
        assert_eq!(stats.games_played.by_day["2026-07-28"], 1);
        assert_eq!(stats.games_played.by_month["2026-07"], 1);
        assert_eq!(stats.move_count["all"], 12);
        assert_eq!(stats.move_count["Standard"], 12);
        assert_eq!(stats.move_count["2026-07"], 12);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_record_game_accumulates_across_calls() {
        let path = temp_path();
        let store = StatsStore::new(&path);
        let at = Utc.with_ymd_and_hms(2026, 7, 28, 9, 30, 0).unwrap();

        store.record_game("Standard", 10, at).await.unwrap();
        store.record_game("Standard", 5, at).await.unwrap();

        let stats = store.read().await.unwrap();
        assert_eq!(stats.games_played.all_time, 2);
        assert_eq!(stats.move_count["all"], 15);
        assert_eq!(stats.move_count["Standard"], 15);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_record_game_tracks_distinct_variants_separately() {
        let path = temp_path();
        let store = StatsStore::new(&path);
        let at = Utc.with_ymd_and_hms(2026, 7, 28, 9, 30, 0).unwrap();

        store.record_game("Standard", 10, at).await.unwrap();
        store.record_game("Chess960", 8, at).await.unwrap();

        let stats = store.read().await.unwrap();
        assert_eq!(stats.move_count["Standard"], 10);
        assert_eq!(stats.move_count["Chess960"], 8);
        assert_eq!(stats.move_count["all"], 18);

        let _ = tokio::fs::remove_file(&path).await;
    }
}
