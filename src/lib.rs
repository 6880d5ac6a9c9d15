//! Focus Timer Library
//!
//! This library provides the core functionality for the focus timer CLI.
//! It includes:
//! - Timer engine with work, short break and long break presets
//! - Countdown drivers and the observer interface for renderers
//! - CLI command parsing, terminal rendering and the interactive session
//! - Type definitions for timer state and user configuration

pub mod cli;
pub mod config;
pub mod engine;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{ConfigError, TimerConfig};
pub use engine::{
    CountdownDriver, IntervalCountdown, ManualCountdown, SharedTimer, StateObserver,
    SubscriptionId, TimerEngine, TimerEvent, TimerUpdate,
};
pub use types::{Mode, ParseModeError, Theme, TickOutcome, TimerPhase, TimerSnapshot, TimerState};
