// Refresh coordinator behavior tests
// Timer cadence, in-flight guarding, visibility transitions, cancellation.
// All timing runs against tokio's paused clock, so no test sleeps for real.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::yield_now;

use vigil_core::{RefreshConfig, RefreshCoordinator, VigilError};

const PERIOD: Duration = Duration::from_secs(30);

/// Advance the paused clock one refresh period and let the timer task run.
async fn pass_one_period() {
    tokio::time::advance(PERIOD).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn settle() {
    for _ in 0..4 {
        yield_now().await;
    }
}

// ============================================================================
// Cadence and failure isolation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_tick_does_not_stop_the_cadence() {
    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    let mut coord = RefreshCoordinator::new(RefreshConfig::new("metrics", PERIOD), move |_| {
        let seen = Arc::clone(&seen);
        async move {
            // First fetch fails like a dropped connection, the rest succeed
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(VigilError::Http("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    });

    coord.start();
    yield_now().await;

    pass_one_period().await;
    let status = coord.status();
    assert!(coord.is_running(), "an error tick must not stop the loop");
    assert_eq!(status.ticks, 1);
    assert_eq!(status.errors, 1);
    assert!(status.last_error.is_some());

    // Next scheduled tick still fires one period later and clears the error
    pass_one_period().await;
    let status = coord.status();
    assert_eq!(status.ticks, 2);
    assert_eq!(status.errors, 1);
    assert!(status.last_error.is_none());
    assert!(status.last_tick.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_lands_one_period_after_start() {
    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    let mut coord = RefreshCoordinator::new(RefreshConfig::new("metrics", PERIOD), move |_| {
        let seen = Arc::clone(&seen);
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    coord.start();
    yield_now().await;

    // Half a period in, nothing has fired yet
    tokio::time::advance(PERIOD / 2).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::advance(PERIOD / 2).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// In-flight guard
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_overlapping_trigger_is_dropped_not_queued() {
    let starts = Arc::new(AtomicU64::new(0));
    let release = Arc::new(Notify::new());

    let seen = Arc::clone(&starts);
    let gate = Arc::clone(&release);
    let coord = RefreshCoordinator::new(RefreshConfig::manual("logs"), move |_| {
        let seen = Arc::clone(&seen);
        let gate = Arc::clone(&gate);
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            gate.notified().await;
            Ok(())
        }
    });

    coord.refresh_now();
    settle().await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert!(coord.is_in_flight());

    // Second trigger while the first fetch is outstanding: skipped
    coord.refresh_now();
    settle().await;
    assert_eq!(starts.load(Ordering::SeqCst), 1, "no overlapping fetch");
    assert_eq!(coord.status().skipped, 1);

    release.notify_one();
    settle().await;
    assert_eq!(coord.status().ticks, 1);
    assert!(!coord.is_in_flight());

    // Guard releases once the fetch resolves
    coord.refresh_now();
    settle().await;
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    release.notify_one();
    settle().await;
}

// ============================================================================
// Manual-only mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_zero_interval_only_fetches_on_manual_trigger() {
    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    let mut coord = RefreshCoordinator::new(RefreshConfig::manual("recovery"), move |_| {
        let seen = Arc::clone(&seen);
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    coord.start();
    assert!(!coord.is_running());

    tokio::time::advance(Duration::from_secs(600)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no timer in manual mode");

    coord.refresh_now();
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Visibility transitions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_hidden_console_stops_fetching_until_visible() {
    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    let mut coord = RefreshCoordinator::new(RefreshConfig::new("metrics", PERIOD), move |_| {
        let seen = Arc::clone(&seen);
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    coord.start();
    yield_now().await;
    pass_one_period().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    coord.set_hidden(true);
    tokio::time::advance(PERIOD * 4).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "hidden console must not fetch");

    coord.set_hidden(false);
    assert!(coord.is_running());
    yield_now().await;
    pass_one_period().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Cancellation on stop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_in_flight_fetch_before_render() {
    let rendered = Arc::new(AtomicBool::new(false));
    let release = Arc::new(Notify::new());

    let flag = Arc::clone(&rendered);
    let gate = Arc::clone(&release);
    let mut coord = RefreshCoordinator::new(RefreshConfig::new("metrics", PERIOD), move |_| {
        let flag = Arc::clone(&flag);
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            // Everything after the await is the render path
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    });

    coord.start();
    yield_now().await;
    tokio::time::advance(PERIOD).await;
    settle().await;
    assert!(coord.is_in_flight());

    coord.stop();
    release.notify_waiters();
    settle().await;

    assert!(!rendered.load(Ordering::SeqCst), "render after stop");
    assert_eq!(coord.status().ticks, 0);

    // A later restart gets a fresh cancellation scope
    coord.start();
    yield_now().await;
    tokio::time::advance(PERIOD).await;
    settle().await;
    release.notify_waiters();
    settle().await;
    assert!(rendered.load(Ordering::SeqCst));
}
