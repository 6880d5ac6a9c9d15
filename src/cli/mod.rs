//! CLI module for the focus timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and the terminal renderer
//! - `session`: Interactive session reading commands from stdin

pub mod commands;
pub mod display;
pub mod session;

pub use commands::{Cli, Commands, RunArgs};
pub use display::{Display, LineState, TerminalRenderer};
pub use session::{CommandError, Flow, Session, SessionCommand};
