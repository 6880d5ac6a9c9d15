//! Timer engine for the focus timer.
//!
//! This module provides the core timer functionality:
//! - State transitions (Idle → Running → Complete)
//! - Ownership of the one countdown process while running
//! - Synchronous observer notification after every change

use tracing::{debug, warn};

use super::countdown::{CountdownDriver, ManualCountdown};
use super::observer::{Observers, StateObserver, SubscriptionId, TimerEvent, TimerUpdate};
use crate::types::{Mode, TickOutcome, TimerPhase, TimerSnapshot, TimerState};

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the timer state and its countdown.
///
/// Every operation is total: calls that make no sense in the current state
/// (starting a running timer, pausing an idle one) are no-ops.
pub struct TimerEngine<D: CountdownDriver = ManualCountdown> {
    /// Current timer state
    state: TimerState,
    /// Registered observers
    observers: Observers,
    /// Registers countdown processes
    driver: D,
    /// Generation and handle of the running countdown
    countdown: Option<(u64, D::Handle)>,
    /// Last generation handed to the driver
    generation: u64,
}

impl<D: CountdownDriver> TimerEngine<D> {
    /// Creates an idle engine in work mode.
    pub fn new(driver: D) -> Self {
        Self::with_mode(Mode::Work, driver)
    }

    /// Creates an idle engine in `mode`.
    pub fn with_mode(mode: Mode, driver: D) -> Self {
        Self {
            state: TimerState::new(mode),
            observers: Observers::new(),
            driver,
            countdown: None,
            generation: 0,
        }
    }

    /// Switches mode, stopping any countdown and restoring the full duration.
    pub fn set_mode(&mut self, mode: Mode) {
        self.halt_countdown();
        self.state.set_mode(mode);
        debug!(mode = %mode, "Mode changed");
        self.emit(TimerEvent::ModeChanged { mode });
    }

    /// Starts or resumes the countdown.
    ///
    /// Returns false without doing anything if the timer is already running,
    /// complete, or has no time left, or if the driver cannot start a
    /// countdown.
    pub fn start(&mut self) -> bool {
        if !self.state.activate() {
            debug!(phase = self.state.phase().as_str(), "Start ignored");
            return false;
        }

        debug_assert!(self.countdown.is_none(), "countdown already registered");
        self.generation += 1;
        let Some(handle) = self.driver.register(self.generation) else {
            self.state.deactivate();
            warn!(generation = self.generation, "Countdown unavailable, start refused");
            return false;
        };
        self.countdown = Some((self.generation, handle));

        debug!(
            generation = self.generation,
            remaining = self.state.remaining_seconds(),
            "Countdown started"
        );
        self.emit(TimerEvent::Started);
        true
    }

    /// Pauses the countdown, keeping the remaining time.
    ///
    /// Returns false if the timer was not running.
    pub fn pause(&mut self) -> bool {
        if !self.state.deactivate() {
            debug!("Pause ignored, timer not running");
            return false;
        }

        self.halt_countdown();
        self.emit(TimerEvent::Paused);
        true
    }

    /// Stops the countdown and restores the full duration of the current mode.
    pub fn reset(&mut self) {
        self.halt_countdown();
        self.state.reset();
        self.emit(TimerEvent::Reset);
    }

    /// Dismisses the completion notification.
    ///
    /// Restores the full duration like [`reset`](Self::reset). Returns false
    /// if the timer was not complete.
    pub fn acknowledge_completion(&mut self) -> bool {
        if !self.state.is_complete() {
            return false;
        }

        self.halt_countdown();
        self.state.reset();
        self.emit(TimerEvent::CompletionAcknowledged);
        true
    }

    /// Counts down one second.
    ///
    /// Driven by the countdown process once per second while running; a tick
    /// while not running changes nothing.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.state.tick();

        match outcome {
            TickOutcome::Ignored => {}
            TickOutcome::Counted => {
                self.emit(TimerEvent::Tick {
                    remaining_seconds: self.state.remaining_seconds(),
                });
            }
            TickOutcome::Completed => {
                self.halt_countdown();
                debug!(mode = %self.state.mode(), "Countdown completed");
                self.emit(TimerEvent::Tick {
                    remaining_seconds: 0,
                });
                self.emit(TimerEvent::Completed {
                    mode: self.state.mode(),
                });
            }
        }

        outcome
    }

    /// Entry point for countdown processes.
    ///
    /// Ticks from a registration other than the current one are dropped.
    /// Returns whether the process should keep running.
    pub fn countdown_tick(&mut self, generation: u64) -> bool {
        match self.countdown {
            Some((current, _)) if current == generation => {
                self.tick();
                self.countdown.is_some()
            }
            _ => {
                debug!(generation, "Stale countdown tick dropped");
                false
            }
        }
    }

    /// Registers an observer.
    pub fn subscribe<O: StateObserver + 'static>(&mut self, observer: O) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Removes an observer. Returns false if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase()
    }

    /// Elapsed fraction of the current mode, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        self.state.formatted_remaining()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.state.snapshot()
    }

    /// Returns true while a countdown process is registered.
    pub fn has_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    fn halt_countdown(&mut self) {
        if let Some((generation, handle)) = self.countdown.take() {
            drop(handle);
            debug!(generation, "Countdown cancelled");
        }
    }

    fn emit(&mut self, event: TimerEvent) {
        self.state.debug_check_invariants();
        debug_assert_eq!(self.state.is_active(), self.countdown.is_some());

        if self.observers.is_empty() {
            return;
        }
        let update = TimerUpdate {
            event,
            snapshot: self.state.snapshot(),
        };
        self.observers.notify(&update);
    }
}

impl<D: CountdownDriver> std::fmt::Debug for TimerEngine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("observers", &self.observers)
            .field("generation", &self.generation)
            .field("has_countdown", &self.countdown.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
