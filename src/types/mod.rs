//! Core data types for the focus timer.
//!
//! This module defines the data structures used for:
//! - Timer presets (modes) and their display themes
//! - Timer state and its transitions
//! - Renderer-facing snapshots

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Mode
// ============================================================================

/// One of the three fixed timer presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 25 minutes of focused work
    #[default]
    Work,
    /// 5 minute break
    ShortBreak,
    /// 15 minute break
    LongBreak,
}

impl Mode {
    /// All presets in display order.
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    /// Returns the fixed duration of this preset in seconds.
    pub const fn duration_seconds(self) -> u32 {
        match self {
            Mode::Work => 25 * 60,
            Mode::ShortBreak => 5 * 60,
            Mode::LongBreak => 15 * 60,
        }
    }

    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::ShortBreak => "short_break",
            Mode::LongBreak => "long_break",
        }
    }

    /// Returns the display theme of this preset.
    pub fn theme(self) -> &'static Theme {
        match self {
            Mode::Work => &THEMES[0],
            Mode::ShortBreak => &THEMES[1],
            Mode::LongBreak => &THEMES[2],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name a mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("不明なモードです: '{0}' (work, short, long のいずれかを指定してください)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Mode::Work),
            "short" | "short-break" | "short_break" => Ok(Mode::ShortBreak),
            "long" | "long-break" | "long_break" => Ok(Mode::LongBreak),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

// ============================================================================
// Theme
// ============================================================================

/// Display theme attached to a mode.
///
/// Only renderers look at this; the timer logic never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    /// Stable theme identifier
    pub id: &'static str,
    /// Two-color gradient (start, end)
    pub gradient: (&'static str, &'static str),
    /// Emoji shown in the title
    pub emoji: &'static str,
    /// Human-readable label
    pub label: &'static str,
}

static THEMES: [Theme; 3] = [
    Theme {
        id: "work",
        gradient: ("#FF6B6B", "#FF8E53"),
        emoji: "🍅",
        label: "作業",
    },
    Theme {
        id: "short_break",
        gradient: ("#43E97B", "#38F9D7"),
        emoji: "☕",
        label: "小休憩",
    },
    Theme {
        id: "long_break",
        gradient: ("#4FACFE", "#7F7FD5"),
        emoji: "🌴",
        label: "長い休憩",
    },
];

// ============================================================================
// TimerPhase
// ============================================================================

/// Coarse state of the timer, derived from [`TimerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Not counting down, not complete
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Reached zero, waiting for acknowledgement
    Complete,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Complete => "complete",
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Result of a single tick applied to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not active, nothing changed
    Ignored,
    /// One second was counted down
    Counted,
    /// The countdown reached zero
    Completed,
}

/// Represents the current state of the timer.
///
/// Fields are private so that `remaining_seconds` always stays within the
/// duration of `mode` and the timer is never active and complete at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerState {
    mode: Mode,
    remaining_seconds: u32,
    is_active: bool,
    is_complete: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(Mode::Work)
    }
}

impl TimerState {
    /// Creates an idle state with the full duration of `mode`.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            remaining_seconds: mode.duration_seconds(),
            is_active: false,
            is_complete: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Returns the derived phase.
    pub fn phase(&self) -> TimerPhase {
        if self.is_complete {
            TimerPhase::Complete
        } else if self.is_active {
            TimerPhase::Running
        } else {
            TimerPhase::Idle
        }
    }

    /// Switches to `mode`, stopping the countdown and restoring the full duration.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    /// Marks the timer active.
    ///
    /// Returns false (and changes nothing) if it is already active, complete,
    /// or has no time left.
    pub fn activate(&mut self) -> bool {
        if self.is_active || self.is_complete || self.remaining_seconds == 0 {
            return false;
        }
        self.is_active = true;
        true
    }

    /// Marks the timer inactive, keeping the remaining time.
    ///
    /// Returns false if it was not active.
    pub fn deactivate(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        true
    }

    /// Stops the timer and restores the full duration of the current mode.
    pub fn reset(&mut self) {
        self.is_active = false;
        self.is_complete = false;
        self.remaining_seconds = self.mode.duration_seconds();
    }

    /// Counts down one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_active {
            return TickOutcome::Ignored;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }

        if self.remaining_seconds == 0 {
            self.is_active = false;
            self.is_complete = true;
            TickOutcome::Completed
        } else {
            TickOutcome::Counted
        }
    }

    /// Fraction of the current mode already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let duration = self.mode.duration_seconds();
        if duration == 0 {
            return 0.0;
        }
        let elapsed = duration.saturating_sub(self.remaining_seconds);
        f64::from(elapsed) / f64::from(duration)
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        format_mm_ss(self.remaining_seconds)
    }

    /// Builds the renderer-facing view of this state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            theme: self.mode.theme().id,
            remaining_seconds: self.remaining_seconds,
            is_active: self.is_active,
            is_complete: self.is_complete,
            phase: self.phase(),
            progress: self.progress(),
            time_remaining: self.formatted_remaining(),
        }
    }

    /// Checks the state invariants (debug builds only).
    pub(crate) fn debug_check_invariants(&self) {
        debug_assert!(
            self.remaining_seconds <= self.mode.duration_seconds(),
            "remaining_seconds {} exceeds duration of {}",
            self.remaining_seconds,
            self.mode
        );
        debug_assert!(
            !(self.is_active && self.is_complete),
            "timer cannot be active and complete at once"
        );
    }
}

/// Formats seconds as zero-padded `MM:SS`.
pub fn format_mm_ss(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Everything a renderer needs to draw the timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    /// Current mode
    pub mode: Mode,
    /// Theme identifier of the mode
    pub theme: &'static str,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u32,
    /// Whether the countdown is running
    #[serde(rename = "isActive")]
    pub is_active: bool,
    /// Whether the completion notification is pending
    #[serde(rename = "isComplete")]
    pub is_complete: bool,
    /// Derived phase
    pub phase: TimerPhase,
    /// Elapsed fraction in `[0, 1]`
    pub progress: f64,
    /// Remaining time as `MM:SS`
    #[serde(rename = "timeRemaining")]
    pub time_remaining: String,
}

// ============================================================================
// Tests
// ============================================================================
