//! Countdown drivers.
//!
//! A driver registers the repeating one-second process that feeds ticks into
//! the engine. The engine keeps the returned handle while the timer runs and
//! drops it to cancel the process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::timer::TimerEngine;

/// Period of the countdown.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Registers countdown processes for the engine.
pub trait CountdownDriver {
    /// Owned handle to a registered process. Dropping it cancels the process.
    type Handle;

    /// Starts a new countdown process tagged with `generation`.
    ///
    /// The process must pass `generation` back to
    /// [`TimerEngine::countdown_tick`] so ticks from a cancelled registration
    /// can be told apart. Returns `None` if no process can be started.
    fn register(&mut self, generation: u64) -> Option<Self::Handle>;
}

// ============================================================================
// ManualCountdown
// ============================================================================

/// Driver without a background process; ticks are fed by calling
/// [`TimerEngine::tick`] directly.
///
/// Clones share their counters, so a test can keep one clone and inspect how
/// many processes the engine registered and how many are still alive.
#[derive(Debug, Clone, Default)]
pub struct ManualCountdown {
    registrations: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl ManualCountdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registrations so far.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Number of registrations whose handle has not been dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Handle of a [`ManualCountdown`] registration.
#[derive(Debug)]
pub struct ManualHandle {
    live: Arc<AtomicUsize>,
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CountdownDriver for ManualCountdown {
    type Handle = ManualHandle;

    fn register(&mut self, _generation: u64) -> Option<ManualHandle> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Some(ManualHandle {
            live: Arc::clone(&self.live),
        })
    }
}

// ============================================================================
// IntervalCountdown
// ============================================================================

/// Driver backed by a tokio task running `tokio::time::interval`.
///
/// The task only holds a weak reference to the engine, so it never keeps a
/// dropped engine alive.
#[derive(Debug)]
pub struct IntervalCountdown {
    engine: Weak<Mutex<TimerEngine<IntervalCountdown>>>,
    period: Duration,
}

impl IntervalCountdown {
    /// Creates a driver feeding ticks into `engine` every [`TICK_INTERVAL`].
    pub fn new(engine: Weak<Mutex<TimerEngine<IntervalCountdown>>>) -> Self {
        Self {
            engine,
            period: TICK_INTERVAL,
        }
    }
}

/// Handle of an [`IntervalCountdown`] registration; aborts the task on drop.
#[derive(Debug)]
pub struct IntervalHandle {
    task: JoinHandle<()>,
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl CountdownDriver for IntervalCountdown {
    type Handle = IntervalHandle;

    /// Returns `None` when called outside of a tokio runtime.
    fn register(&mut self, generation: u64) -> Option<IntervalHandle> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(generation, "No tokio runtime, countdown not started");
            return None;
        };
        let engine = self.engine.clone();
        let period = self.period;

        let task = runtime.spawn(async move {
            // First tick one full period after start.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let Some(engine) = engine.upgrade() else {
                    debug!(generation, "Engine dropped, countdown exiting");
                    break;
                };
                let mut guard = engine.lock().unwrap_or_else(PoisonError::into_inner);
                if !guard.countdown_tick(generation) {
                    break;
                }
            }
        });

        Some(IntervalHandle { task })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_counts_registrations_and_live_handles() {
        let mut driver = ManualCountdown::new();
        let observer = driver.clone();

        let first = driver.register(1).unwrap();
        let second = driver.register(2).unwrap();
        assert_eq!(observer.registrations(), 2);
        assert_eq!(observer.live(), 2);

        drop(first);
        assert_eq!(observer.live(), 1);
        drop(second);
        assert_eq!(observer.live(), 0);
        assert_eq!(observer.registrations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_handle_drop_aborts_task() {
        let mut driver = IntervalCountdown::new(Weak::new());

        let handle = driver.register(1).unwrap();
        let aborted = handle.task.abort_handle();
        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(aborted.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_task_exits_without_engine() {
        let mut driver = IntervalCountdown::new(Weak::new());

        let handle = driver.register(1).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(handle.task.is_finished());
    }

    #[test]
    fn test_interval_register_outside_runtime_refuses() {
        let mut driver = IntervalCountdown::new(Weak::new());

        assert!(driver.register(1).is_none());
    }
}
