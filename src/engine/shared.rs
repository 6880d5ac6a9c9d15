//! Shared, self-driving timer.
//!
//! [`SharedTimer`] wires a [`TimerEngine`] to an [`IntervalCountdown`] so the
//! countdown advances on its own inside a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::countdown::IntervalCountdown;
use super::observer::{StateObserver, SubscriptionId};
use super::timer::TimerEngine;
use crate::types::{Mode, TimerSnapshot};

/// Engine driven by a tokio interval.
pub type IntervalEngine = TimerEngine<IntervalCountdown>;

/// Cloneable handle to an engine whose countdown runs on a tokio task.
///
/// Each call takes the engine lock for the duration of one operation, so
/// operations and ticks never interleave. Operations that start a countdown
/// must run inside a tokio runtime.
#[derive(Clone)]
pub struct SharedTimer {
    inner: Arc<Mutex<IntervalEngine>>,
}

impl SharedTimer {
    /// Creates an idle timer in `mode`.
    pub fn new(mode: Mode) -> Self {
        let inner = Arc::new_cyclic(|weak| {
            Mutex::new(TimerEngine::with_mode(
                mode,
                IntervalCountdown::new(weak.clone()),
            ))
        });
        Self { inner }
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut IntervalEngine) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn set_mode(&self, mode: Mode) {
        self.lock().set_mode(mode);
    }

    pub fn start(&self) -> bool {
        self.lock().start()
    }

    pub fn pause(&self) -> bool {
        self.lock().pause()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn acknowledge_completion(&self) -> bool {
        self.lock().acknowledge_completion()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe<O: StateObserver + 'static>(&self, observer: O) -> SubscriptionId {
        self.lock().subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().unsubscribe(id)
    }

    fn lock(&self) -> MutexGuard<'_, IntervalEngine> {
        // Invariants are re-established before observers run, so a panic in
        // an observer leaves a usable state behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SharedTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTimer")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::observer::{TimerEvent, TimerUpdate};
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Duration};

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_once_per_second() {
        let timer = SharedTimer::new(Mode::Work);

        timer.start();
        sleep(Duration::from_millis(3500)).await;

        assert_eq!(timer.snapshot().remaining_seconds, 1497);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_first_second() {
        let timer = SharedTimer::new(Mode::Work);

        timer.start();
        sleep(Duration::from_millis(900)).await;

        assert_eq!(timer.snapshot().remaining_seconds, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_does_not_double_decrement() {
        let timer = SharedTimer::new(Mode::Work);

        assert!(timer.start());
        assert!(!timer.start());
        sleep(Duration::from_millis(5500)).await;

        assert_eq!(timer.snapshot().remaining_seconds, 1495);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_countdown() {
        let timer = SharedTimer::new(Mode::Work);

        timer.start();
        sleep(Duration::from_millis(2500)).await;
        timer.pause();
        sleep(Duration::from_secs(10)).await;

        assert_eq!(timer.snapshot().remaining_seconds, 1498);
        assert!(!timer.with(|engine| engine.has_countdown()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_break_completes() {
        let timer = SharedTimer::new(Mode::ShortBreak);
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerUpdate>();
        timer.subscribe(tx);

        timer.start();
        sleep(Duration::from_secs(301)).await;

        let snapshot = timer.snapshot();
        assert!(snapshot.is_complete);
        assert!(!snapshot.is_active);
        assert_eq!(snapshot.remaining_seconds, 0);

        let mut completed = 0;
        while let Ok(update) = rx.try_recv() {
            if matches!(update.event, TimerEvent::Completed { .. }) {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_timer_cancels_countdown() {
        let timer = SharedTimer::new(Mode::Work);
        let weak = Arc::downgrade(&timer.inner);

        timer.start();
        drop(timer);
        sleep(Duration::from_secs(2)).await;

        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_start_outside_runtime_is_refused() {
        let timer = SharedTimer::new(Mode::Work);
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerUpdate>();
        timer.subscribe(tx);

        assert!(!timer.start());

        let snapshot = timer.snapshot();
        assert!(!snapshot.is_active);
        assert_eq!(snapshot.remaining_seconds, 1500);
        assert!(!timer.with(|engine| engine.has_countdown()));
        assert!(rx.try_recv().is_err());
    }
}
