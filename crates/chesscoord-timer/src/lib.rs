//! Cancellable one-shot timers.
//!
//! Every game runs several independent countdowns — the active player's
//! time-loss deadline, an AFK auto-resign, a disconnect grace period and
//! its own auto-resign, and a post-conclusion deletion window (§5). Each
//! is armed once, fires at most once, and can be cancelled at any point;
//! cancellation is idempotent even if the timer has already fired,
//! because [`TimerHandle::cancel`] aborts the backing task rather than
//! asserting it is still live — a caller that needs "did this actually
//! fire" must recheck its own state (e.g. the game's conclusion), not
//! trust the cancel call.
//!
//! The fired callback is an arbitrary future, so callers enqueue a
//! message onto their own per-game channel rather than mutate state
//! directly from here — that keeps a timer firing for game G subject to
//! the same serialization discipline as any other handler for G (§5).

mod error;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

pub use error::TimerError;

/// Which countdown a handle represents. Carried only for logging —
/// nothing here branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// A player's clock reaching zero.
    AutoTimeLoss,
    /// 20s after a player declares themselves AFK.
    AfkAutoResign,
    /// The grace period before a disconnect's own auto-resign arms.
    DisconnectStart,
    /// 60s (resignable) or 20s (otherwise) after a disconnect.
    DisconnectAutoResign,
    /// 15s post-conclusion window before archival.
    Deletion,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerKind::AutoTimeLoss => "auto-time-loss",
            TimerKind::AfkAutoResign => "afk-auto-resign",
            TimerKind::DisconnectStart => "disconnect-start",
            TimerKind::DisconnectAutoResign => "disconnect-auto-resign",
            TimerKind::Deletion => "deletion",
        };
        write!(f, "{s}")
    }
}

#[derive(Default)]
struct Counters {
    total_armed: AtomicU64,
    total_fired: AtomicU64,
    total_cancelled: AtomicU64,
}

/// A point-in-time snapshot of [`TimerService`]'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerMetrics {
    pub total_armed: u64,
    pub total_fired: u64,
    pub total_cancelled: u64,
}

/// A single armed timer. Dropping a handle without calling
/// [`cancel`](Self::cancel) leaves the underlying task running — callers
/// that mean to cancel must call `cancel` explicitly.
pub struct TimerHandle {
    kind: TimerKind,
    fire_at: Instant,
    join: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl TimerHandle {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Time remaining until this timer's deadline, clamped to zero.
    pub fn remaining(&self) -> Duration {
        self.fire_at.saturating_duration_since(Instant::now())
    }

    /// Whether the timer has already fired (its callback has run to
    /// completion, or it was already cancelled).
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancels the timer. Safe to call even if the timer already fired —
    /// aborting a finished task is a no-op. Does not, by itself, tell
    /// the caller whether the cancel won a race with a firing callback;
    /// callers must recheck their own state for that.
    pub fn cancel(self) {
        if !self.join.is_finished() {
            self.join.abort();
            self.counters.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(kind = %self.kind, "timer cancelled");
        }
    }
}

/// Arms timers and tracks how many have been armed, fired, and
/// cancelled. One `TimerService` is shared across every timer a single
/// game actor owns (it is cheap to clone — internally an `Arc`).
#[derive(Clone, Default)]
pub struct TimerService {
    counters: Arc<Counters>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer that awaits `on_fire` after `duration` elapses.
    pub fn schedule<F>(&self, kind: TimerKind, duration: Duration, on_fire: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.counters.total_armed.fetch_add(1, Ordering::Relaxed);
        let fire_at = Instant::now() + duration;
        let counters = Arc::clone(&self.counters);
        debug!(kind = %kind, duration_ms = duration.as_millis(), "timer armed");
        let join = tokio::spawn(async move {
            time::sleep(duration).await;
            on_fire.await;
            counters.total_fired.fetch_add(1, Ordering::Relaxed);
        });
        TimerHandle {
            kind,
            fire_at,
            join,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Arms a timer for an absolute deadline instead of a duration.
    /// Rejects a deadline already in the past rather than silently
    /// firing with a zero-length sleep.
    pub fn schedule_at<F>(
        &self,
        kind: TimerKind,
        deadline: Instant,
        on_fire: F,
    ) -> Result<TimerHandle, TimerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let now = Instant::now();
        if deadline < now {
            return Err(TimerError::DeadlineInPast(kind));
        }
        Ok(self.schedule(kind, deadline - now, on_fire))
    }

    pub fn metrics(&self) -> TimerMetrics {
        TimerMetrics {
            total_armed: self.counters.total_armed.load(Ordering::Relaxed),
            total_fired: self.counters.total_fired.load(Ordering::Relaxed),
            total_cancelled: self.counters.total_cancelled.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_kind_display_is_stable() {
        assert_eq!(TimerKind::AfkAutoResign.to_string(), "afk-auto-resign");
        assert_eq!(TimerKind::Deletion.to_string(), "deletion");
    }

    #[test]
    fn test_initial_metrics_are_zero() {
        let svc = TimerService::new();
        assert_eq!(svc.metrics(), TimerMetrics::default());
    }
}
