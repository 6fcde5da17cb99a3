//! Integration tests for the one-shot timer service.
//!
//! Uses `tokio::time::pause()` so deadlines resolve deterministically
//! under `tokio::time::advance` instead of real wall-clock sleeps.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chesscoord_timer::{TimerKind, TimerService};

#[tokio::test(start_paused = true)]
async fn test_timer_fires_after_duration() {
    let svc = TimerService::new();
    let fired = Arc::new(AtomicBool::new(false));
    let fired2 = fired.clone();

    let _handle = svc.schedule(TimerKind::Deletion, Duration::from_secs(15), async move {
        fired2.store(true, Ordering::SeqCst);
    });

    assert!(!fired.load(Ordering::SeqCst));
    tokio::time::advance(Duration::from_secs(15)).await;
    tokio::task::yield_now().await;
    assert!(fired.load(Ordering::SeqCst));
    assert_eq!(svc.metrics().total_fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_fire_prevents_callback() {
    let svc = TimerService::new();
    let fired = Arc::new(AtomicBool::new(false));
    let fired2 = fired.clone();

    let handle = svc.schedule(TimerKind::AfkAutoResign, Duration::from_secs(20), async move {
        fired2.store(true, Ordering::SeqCst);
    });
    handle.cancel();

    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert!(!fired.load(Ordering::SeqCst));
    assert_eq!(svc.metrics().total_cancelled, 1);
    assert_eq!(svc.metrics().total_fired, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_fire_is_a_harmless_noop() {
    let svc = TimerService::new();
    let count = Arc::new(AtomicU32::new(0));
    let count2 = count.clone();

    let handle = svc.schedule(TimerKind::DisconnectAutoResign, Duration::from_secs(5), async move {
        count2.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::advance(Duration::from_secs(5)).await;
    tokio::task::yield_now().await;
    assert!(handle.is_finished());

    // Cancelling a timer that already fired must not panic or re-fire.
    handle.cancel();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_at_rejects_deadline_already_past() {
    let svc = TimerService::new();
    let past = tokio::time::Instant::now() - Duration::from_secs(1);
    let result = svc.schedule_at(TimerKind::AutoTimeLoss, past, async {});
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_schedule_at_future_deadline_fires_on_time() {
    let svc = TimerService::new();
    let fired = Arc::new(AtomicBool::new(false));
    let fired2 = fired.clone();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);

    let _handle = svc
        .schedule_at(TimerKind::DisconnectAutoResign, deadline, async move {
            fired2.store(true, Ordering::SeqCst);
        })
        .unwrap();

    tokio::time::advance(Duration::from_secs(59)).await;
    tokio::task::yield_now().await;
    assert!(!fired.load(Ordering::SeqCst));

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert!(fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_remaining_counts_down() {
    let svc = TimerService::new();
    let handle = svc.schedule(TimerKind::DisconnectStart, Duration::from_secs(5), async {});
    assert_eq!(handle.remaining(), Duration::from_secs(5));

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(handle.remaining(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_multiple_independent_timers_fire_separately() {
    let svc = TimerService::new();
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let o1 = order.clone();
    let _h1 = svc.schedule(TimerKind::AfkAutoResign, Duration::from_secs(20), async move {
        o1.lock().unwrap().push("afk");
    });
    let o2 = order.clone();
    let _h2 = svc.schedule(TimerKind::DisconnectAutoResign, Duration::from_secs(60), async move {
        o2.lock().unwrap().push("disconnect");
    });

    tokio::time::advance(Duration::from_secs(20)).await;
    tokio::task::yield_now().await;
    assert_eq!(*order.lock().unwrap(), vec!["afk"]);

    tokio::time::advance(Duration::from_secs(40)).await;
    tokio::task::yield_now().await;
    assert_eq!(*order.lock().unwrap(), vec!["afk", "disconnect"]);
}
