//! State change observation.
//!
//! Renderers register a [`StateObserver`] with the engine and receive a
//! [`TimerUpdate`] synchronously after every state change.

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{Mode, TimerSnapshot};

// ============================================================================
// TimerEvent
// ============================================================================

/// What changed in the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Mode switched (countdown stopped, duration restored)
    ModeChanged {
        /// New mode
        mode: Mode,
    },
    /// Countdown started or resumed
    Started,
    /// Countdown paused
    Paused,
    /// Timer reset to the full duration
    Reset,
    /// One second elapsed
    Tick {
        /// Remaining seconds after the tick
        remaining_seconds: u32,
    },
    /// Countdown reached zero
    Completed {
        /// Mode that completed
        mode: Mode,
    },
    /// Completion notification dismissed
    CompletionAcknowledged,
}

/// A change notification: the event plus the state right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerUpdate {
    pub event: TimerEvent,
    pub snapshot: TimerSnapshot,
}

// ============================================================================
// StateObserver
// ============================================================================

/// Receives timer updates.
///
/// Called with the engine borrowed, so implementations must not call back
/// into the engine.
pub trait StateObserver: Send {
    fn notify(&mut self, update: &TimerUpdate);
}

impl<F> StateObserver for F
where
    F: FnMut(&TimerUpdate) + Send,
{
    fn notify(&mut self, update: &TimerUpdate) {
        self(update)
    }
}

impl StateObserver for mpsc::UnboundedSender<TimerUpdate> {
    fn notify(&mut self, update: &TimerUpdate) {
        if self.send(update.clone()).is_err() {
            debug!("Observer channel closed, dropping update");
        }
    }
}

impl StateObserver for crossbeam_channel::Sender<TimerUpdate> {
    fn notify(&mut self, update: &TimerUpdate) {
        if self.send(update.clone()).is_err() {
            debug!("Renderer channel closed, dropping update");
        }
    }
}

// ============================================================================
// Observers
// ============================================================================

/// Handle returned by subscribe, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered registry of observers.
#[derive(Default)]
pub struct Observers {
    entries: Vec<(SubscriptionId, Box<dyn StateObserver>)>,
    next_id: u64,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer; updates are delivered in registration order.
    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Removes an observer. Returns false if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delivers `update` to every observer.
    pub fn notify(&mut self, update: &TimerUpdate) {
        for (_, observer) in &mut self.entries {
            observer.notify(update);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
