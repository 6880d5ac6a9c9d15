//! Engine module for the focus timer.
//!
//! This module contains the timer state machine and what drives it:
//! - `timer`: Timer engine with state transitions and countdown ownership
//! - `countdown`: One-second countdown drivers (tokio interval, manual)
//! - `observer`: Subscription interface for renderers
//! - `shared`: Self-driving engine handle for use inside a tokio runtime

pub mod countdown;
pub mod observer;
pub mod shared;
pub mod timer;

pub use countdown::{CountdownDriver, IntervalCountdown, ManualCountdown, TICK_INTERVAL};
pub use observer::{Observers, StateObserver, SubscriptionId, TimerEvent, TimerUpdate};
pub use shared::{IntervalEngine, SharedTimer};
pub use timer::TimerEngine;
