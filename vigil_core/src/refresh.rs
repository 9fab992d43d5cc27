//! Refresh coordination for auto-updating dashboards
//!
//! Every dashboard in the console runs the same cycle: fetch a JSON payload
//! from the portal, hand it to a render target, sleep, repeat. The
//! [`RefreshCoordinator`] owns that cycle for one dashboard: it schedules the
//! periodic tick, pauses and resumes across visibility changes, accepts
//! manual triggers, and guarantees that at most one fetch is ever in flight.
//!
//! A tick that fails logs and counts the error but never stops the loop; the
//! next scheduled tick is the retry. Stopping the coordinator cancels both
//! the timer and any fetch already dispatched, so a stale payload can never
//! be rendered after `stop()`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::error::VigilResult;

type TickFn = dyn Fn(RefreshCancel) -> BoxFuture<'static, VigilResult<()>> + Send + Sync;

/// Per-dashboard refresh policy.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Dashboard name used in logs and status lines
    pub label: String,
    /// Tick cadence; `Duration::ZERO` means manual-only (no timer is created)
    pub interval: Duration,
    /// Restart automatically when the console becomes visible again
    pub resume_on_visible: bool,
}

impl RefreshConfig {
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        Self {
            label: label.into(),
            interval,
            resume_on_visible: true,
        }
    }

    pub fn manual(label: impl Into<String>) -> Self {
        Self::new(label, Duration::ZERO)
    }

    pub fn resume_on_visible(mut self, resume: bool) -> Self {
        self.resume_on_visible = resume;
        self
    }
}

/// How the coordinator schedules ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Timer-driven on a fixed interval
    Auto,
    /// No timer; only `refresh_now` issues fetches
    Manual,
}

/// Point-in-time view of a coordinator, for status lines and tests.
#[derive(Debug, Clone)]
pub struct RefreshStatus {
    pub mode: RefreshMode,
    pub running: bool,
    pub in_flight: bool,
    /// Completed ticks (successful or failed)
    pub ticks: u64,
    /// Ticks dropped because a fetch was still in flight
    pub skipped: u64,
    pub errors: u64,
    pub last_tick: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl RefreshStatus {
    /// Short label for dashboard footers
    pub fn label(&self) -> &'static str {
        match self.mode {
            RefreshMode::Manual => "MANUAL",
            RefreshMode::Auto if self.running => "LIVE",
            RefreshMode::Auto => "PAUSED",
        }
    }
}

/// Cancellation token handed to every tick.
///
/// The coordinator races each tick against this token, so a fetch future is
/// dropped the moment `stop()` fires. Ticks that produce side effects after
/// an await point should also check [`RefreshCancel::is_cancelled`] before
/// applying a result.
#[derive(Debug, Clone)]
pub struct RefreshCancel {
    rx: watch::Receiver<bool>,
}

impl RefreshCancel {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the owning coordinator is stopped or dropped.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        // Sender gone means the coordinator itself was dropped.
    }
}

/// Shared between the coordinator handle and its spawned tasks.
struct Shared {
    label: String,
    tick_fn: Box<TickFn>,
    /// Serializes ticks: held for the whole fetch, try-acquired by new ticks
    gate: tokio::sync::Mutex<()>,
    in_flight: AtomicBool,
    ticks: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
    last_tick: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
}

impl Shared {
    /// Run one fetch-and-render cycle, skipping if one is already in flight.
    async fn run_tick(&self, cancel: RefreshCancel) {
        let _guard = match self.gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                trace!(dashboard = %self.label, "tick skipped, fetch already in flight");
                return;
            }
        };

        self.in_flight.store(true, Ordering::Release);
        let watchdog = cancel.clone();
        let outcome = tokio::select! {
            result = (self.tick_fn)(cancel) => Some(result),
            _ = watchdog.cancelled() => None,
        };
        self.in_flight.store(false, Ordering::Release);

        match outcome {
            Some(Ok(())) => {
                self.ticks.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut last) = self.last_tick.lock() {
                    *last = Some(Utc::now());
                }
                if let Ok(mut err) = self.last_error.lock() {
                    *err = None;
                }
            }
            Some(Err(e)) => {
                self.ticks.fetch_add(1, Ordering::Relaxed);
                self.errors.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut err) = self.last_error.lock() {
                    *err = Some(e.to_string());
                }
                warn!(dashboard = %self.label, error = %e, "refresh tick failed");
            }
            None => {
                trace!(dashboard = %self.label, "tick cancelled mid-flight");
            }
        }
    }
}

/// Owns the timer lifecycle and refresh policy for one dashboard.
pub struct RefreshCoordinator {
    config: RefreshConfig,
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
    cancel_tx: watch::Sender<bool>,
    resume_when_visible: bool,
}

impl RefreshCoordinator {
    /// Create a coordinator around an async tick callback.
    ///
    /// The callback is invoked on every scheduled or manual tick; it should
    /// fetch, then deliver the payload to its render target. Errors are
    /// contained to the tick that produced them.
    pub fn new<F, Fut>(config: RefreshConfig, tick: F) -> Self
    where
        F: Fn(RefreshCancel) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = VigilResult<()>> + Send + 'static,
    {
        let (cancel_tx, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            label: config.label.clone(),
            tick_fn: Box::new(move |cancel| Box::pin(tick(cancel))),
            gate: tokio::sync::Mutex::new(()),
            in_flight: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            last_tick: Mutex::new(None),
            last_error: Mutex::new(None),
        });
        Self {
            config,
            shared,
            timer: None,
            cancel_tx,
            resume_when_visible: false,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn mode(&self) -> RefreshMode {
        if self.config.interval.is_zero() {
            RefreshMode::Manual
        } else {
            RefreshMode::Auto
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Start the periodic timer. Idempotent; a coordinator that is already
    /// running keeps its existing timer. In manual mode no timer is created.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        if self.config.interval.is_zero() {
            debug!(dashboard = %self.config.label, "manual-only refresh, no timer scheduled");
            return;
        }

        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel_token();
        let period = self.config.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // Drop ticks that pile up behind a slow fetch instead of queueing
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval() fires immediately; consume that so the first real
            // tick lands at now + period, matching the page timer it replaces
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => shared.run_tick(cancel.clone()).await,
                }
            }
        });
        self.timer = Some(handle);
        debug!(dashboard = %self.config.label, interval_secs = period.as_secs(), "refresh started");
    }

    /// Cancel the timer and any in-flight fetch. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.timer.is_some();
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
        // Cancel outstanding ticks (timer-driven or manual), then open a
        // fresh epoch so later start()/refresh_now() calls are unaffected
        let _ = self.cancel_tx.send(true);
        let (cancel_tx, _) = watch::channel(false);
        self.cancel_tx = cancel_tx;
        // An aborted tick never reaches its own cleanup
        self.shared.in_flight.store(false, Ordering::Release);
        if was_running {
            debug!(dashboard = %self.config.label, "refresh stopped");
        }
    }

    /// Stop if running, else start with the configured interval.
    pub fn toggle(&mut self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Visibility transition: hiding pauses the timer, becoming visible
    /// restores whatever was running before, subject to `resume_on_visible`.
    /// This is the only path that resumes a paused coordinator automatically.
    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden {
            self.resume_when_visible = self.is_running();
            self.stop();
        } else {
            let resume = std::mem::take(&mut self.resume_when_visible);
            if resume && self.config.resume_on_visible {
                self.start();
            }
        }
    }

    /// Manual trigger; runs one tick immediately, subject to the same
    /// in-flight guard as scheduled ticks.
    pub fn refresh_now(&self) {
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel_token();
        tokio::spawn(async move {
            shared.run_tick(cancel).await;
        });
    }

    pub fn status(&self) -> RefreshStatus {
        RefreshStatus {
            mode: self.mode(),
            running: self.is_running(),
            in_flight: self.is_in_flight(),
            ticks: self.shared.ticks.load(Ordering::Relaxed),
            skipped: self.shared.skipped.load(Ordering::Relaxed),
            errors: self.shared.errors.load(Ordering::Relaxed),
            last_tick: self.shared.last_tick.lock().ok().and_then(|g| *g),
            last_error: self
                .shared
                .last_error
                .lock()
                .ok()
                .and_then(|g| (*g).clone()),
        }
    }

    fn cancel_token(&self) -> RefreshCancel {
        RefreshCancel {
            rx: self.cancel_tx.subscribe(),
        }
    }
}

impl Drop for RefreshCoordinator {
    fn drop(&mut self) {
        // No timer may outlive its dashboard
        self.stop();
    }
}
