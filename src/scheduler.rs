//! Periodic task scheduler
//!
//! Runs a [`TickTask`] forever on a fixed delay until a shared shutdown
//! signal is raised. The task's state is an explicit value: the driver owns
//! it, lends it to each tick, and swaps in whatever the tick returns. A tick
//! that fails (or panics) is logged and its state discarded; the previous
//! state is kept for the next tick.

use crate::error::MonitorError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Body of a periodic task
#[async_trait]
pub trait TickTask: Send {
    /// State threaded from one tick to the next. Use `()` for stateless tasks.
    type State: Send + Sync + 'static;

    async fn tick(&mut self, state: &Self::State) -> Result<Self::State, MonitorError>;
}

/// Shared cancellation signal for any number of schedulers
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Stop issuing ticks. In-flight ticks run to completion.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only counters for observability
#[derive(Debug, Default)]
pub struct TaskStats {
    ticks: AtomicU64,
    failures: AtomicU64,
    // Unix millis, 0 = never run
    last_run_ms: AtomicI64,
}

impl TaskStats {
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Start time of the most recent tick
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        match self.last_run_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        }
    }

    fn record_start(&self, at: DateTime<Utc>) {
        self.last_run_ms.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    fn record_finish(&self, failed: bool) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub struct PeriodicTask {
    name: String,
    interval: Duration,
    stats: Arc<TaskStats>,
}

impl PeriodicTask {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            stats: Arc::new(TaskStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<TaskStats> {
        self.stats.clone()
    }

    /// Drive `task` until shutdown; returns the last committed state
    ///
    /// Fixed delay: the first tick fires immediately and each wait starts
    /// after the previous tick returns, so ticks never overlap.
    ///
    /// Arguments:
    /// - `task`: tick body, owned by the loop for its whole life
    /// - `initial`: state lent to the first tick
    /// - `shutdown`: receiver from [`Shutdown::subscribe`]. Checked before each
    ///   tick and awaited during each wait. A dropped sender counts as shutdown.
    ///
    /// Returns the state from the last tick that returned `Ok`, or `initial`
    /// if none did. Failed and panicking ticks are logged, counted in
    /// [`TaskStats`], and never end the loop.
    pub async fn run<T: TickTask>(
        &self,
        mut task: T,
        initial: T::State,
        mut shutdown: watch::Receiver<bool>,
    ) -> T::State {
        log::info!("⏰ Starting {} scheduler (interval: {}s)", self.name, self.interval.as_secs());

        let mut state = initial;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.stats.record_start(Utc::now());
            let started = std::time::Instant::now();

            let outcome = AssertUnwindSafe(task.tick(&state)).catch_unwind().await;
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => Err(MonitorError::Panicked(panic_message(panic.as_ref()))),
            };

            match result {
                Ok(next) => {
                    state = next;
                    self.stats.record_finish(false);
                    log::debug!("✅ {} tick finished in {}ms", self.name, started.elapsed().as_millis());
                }
                Err(e) => {
                    self.stats.record_finish(true);
                    log::error!("❌ Error in {} tick: {}", self.name, e);
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        log::warn!("⚠️  {} shutdown handle dropped, stopping", self.name);
                        break;
                    }
                }
            }
        }

        log::info!("✅ {} scheduler stopped after {} ticks", self.name, self.stats.tick_count());
        state
    }

    /// Run on the tokio runtime in the background
    ///
    /// Same arguments as [`PeriodicTask::run`]. The returned handle exposes
    /// the shared [`TaskStats`] while running and the final state once
    /// `shutdown` fires and the in-flight tick (if any) has finished.
    pub fn spawn<T>(self, task: T, initial: T::State, shutdown: watch::Receiver<bool>) -> TaskHandle<T::State>
    where
        T: TickTask + 'static,
    {
        let name = self.name.clone();
        let stats = self.stats.clone();
        let join = tokio::spawn(async move { self.run(task, initial, shutdown).await });

        TaskHandle { name, stats, join }
    }
}

/// Handle to a spawned scheduler
pub struct TaskHandle<S> {
    name: String,
    stats: Arc<TaskStats>,
    join: JoinHandle<S>,
}

impl<S> TaskHandle<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> Arc<TaskStats> {
        self.stats.clone()
    }

    /// Wait for the scheduler loop to exit and return its final state
    pub async fn join(self) -> Result<S, tokio::task::JoinError> {
        self.join.await
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
