use crate::TimerKind;

#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// `schedule_at` was asked for a deadline already in the past — the
    /// caller must decide whether to fire immediately or treat the
    /// window as already missed, rather than the timer silently firing
    /// with a zero or negative duration.
    #[error("{0} timer deadline is already in the past")]
    DeadlineInPast(TimerKind),
}
