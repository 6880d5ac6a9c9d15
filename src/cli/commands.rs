//! Command definitions for the focus timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{TimerConfig, MAX_PROGRESS_BAR_WIDTH, MIN_PROGRESS_BAR_WIDTH};
use crate::types::Mode;

// ============================================================================
// CLI Structure
// ============================================================================

/// Focus Timer CLI - work, short break and long break countdowns
#[derive(Parser, Debug)]
#[command(
    name = "focus-timer",
    version,
    about = "シンプルなフォーカスタイマーCLI",
    long_about = "作業 (25分)・小休憩 (5分)・長い休憩 (15分) の3つのプリセットを持つ\n\
                  ターミナル上のカウントダウンタイマー。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open an interactive timer session
    Run(RunArgs),

    /// List the timer presets
    Modes {
        /// Print the presets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Initial mode (work, short, long)
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Start counting down immediately
    #[arg(short, long)]
    pub auto_start: bool,

    /// Progress bar width in cells (5-100)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u16).range(MIN_PROGRESS_BAR_WIDTH as i64..=MAX_PROGRESS_BAR_WIDTH as i64)
    )]
    pub width: Option<u16>,

    /// Hide mode emoji in the title
    #[arg(long)]
    pub no_emoji: bool,

    /// Path to a JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Applies the command-line overrides on top of `config`.
    pub fn apply(&self, mut config: TimerConfig) -> TimerConfig {
        if let Some(mode) = self.mode {
            config.initial_mode = mode;
        }
        if self.auto_start {
            config.auto_start = true;
        }
        if let Some(width) = self.width {
            config.progress_bar_width = width;
        }
        if self.no_emoji {
            config.show_emoji = false;
        }
        config
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a mode name.
fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse::<Mode>().map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
