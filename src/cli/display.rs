//! Display utilities for the focus timer CLI.
//!
//! This module provides formatted output for:
//! - Timer titles and progress bars
//! - The terminal renderer that follows engine updates
//! - Mode listing, status and help text

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::{StateObserver, TimerEvent, TimerUpdate};
use crate::types::{Mode, TimerPhase, TimerSnapshot};

/// Character for the elapsed part of the progress bar
const FILLED: char = '#';

/// Character for the remaining part of the progress bar
const EMPTY: char = '-';

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Generates the timer title.
    ///
    /// Format: `"🍅 MM:SS"`, or `"作業 MM:SS"` without emoji.
    pub fn format_title(snapshot: &TimerSnapshot, show_emoji: bool) -> String {
        let theme = snapshot.mode.theme();
        let prefix = if show_emoji { theme.emoji } else { theme.label };
        format!("{} {}", prefix, snapshot.time_remaining)
    }

    /// Renders `progress` as a bar of `width` cells.
    pub fn progress_bar(progress: f64, width: u16) -> String {
        let width = usize::from(width.max(1));
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let filled = ((progress * width as f64).round() as usize).min(width);

        let mut bar = String::with_capacity(width + 2);
        bar.push('[');
        bar.extend(std::iter::repeat(FILLED).take(filled));
        bar.extend(std::iter::repeat(EMPTY).take(width - filled));
        bar.push(']');
        bar
    }

    /// Formats one status line: title, bar, percentage and phase.
    pub fn format_status_line(snapshot: &TimerSnapshot, show_emoji: bool, width: u16) -> String {
        format!(
            "{} {} {:>3}% {}",
            Self::format_title(snapshot, show_emoji),
            Self::progress_bar(snapshot.progress, width),
            (snapshot.progress * 100.0).round() as u32,
            Self::phase_label(snapshot.phase)
        )
    }

    /// Returns the label of a phase.
    pub fn phase_label(phase: TimerPhase) -> &'static str {
        match phase {
            TimerPhase::Idle => "停止中",
            TimerPhase::Running => "実行中",
            TimerPhase::Complete => "完了",
        }
    }

    /// Formats the completion notification.
    pub fn format_completion(mode: Mode) -> String {
        format!(
            "🔔 {}セッションが完了しました！ 'ok' で通知を閉じます",
            mode.theme().label
        )
    }

    /// Formats the preset list.
    pub fn format_modes() -> String {
        let mut out = String::from("モード一覧\n─────────────────────────────\n");
        for mode in Mode::ALL {
            let theme = mode.theme();
            out.push_str(&format!(
                "{} {:<12} {:>2}分  {} → {}\n",
                theme.emoji,
                mode.as_str(),
                mode.duration_seconds() / 60,
                theme.gradient.0,
                theme.gradient.1
            ));
        }
        out
    }

    /// Formats the preset list as pretty JSON.
    pub fn format_modes_json() -> serde_json::Result<String> {
        let presets: Vec<serde_json::Value> = Mode::ALL
            .iter()
            .map(|mode| {
                serde_json::json!({
                    "mode": mode,
                    "durationSeconds": mode.duration_seconds(),
                    "theme": mode.theme(),
                })
            })
            .collect();
        serde_json::to_string_pretty(&presets)
    }

    /// Shows the preset list.
    pub fn show_modes() {
        print!("{}", Self::format_modes());
    }

    /// Formats the current timer status.
    pub fn format_status(snapshot: &TimerSnapshot) -> String {
        format!(
            "フォーカスタイマー ステータス\n\
             ─────────────────────────────\n\
             モード: {}\n\
             状態: {}\n\
             残り時間: {}\n\
             進捗: {}%",
            snapshot.mode.theme().label,
            Self::phase_label(snapshot.phase),
            snapshot.time_remaining,
            (snapshot.progress * 100.0).round() as u32
        )
    }

    /// Formats the session command help.
    pub fn format_help() -> &'static str {
        "コマンド:\n\
         \x20 start (s)        タイマーを開始/再開\n\
         \x20 pause (p)        一時停止\n\
         \x20 toggle (t)       開始と一時停止を切り替え\n\
         \x20 reset (r)        リセット\n\
         \x20 mode <m> (m)     モード切替 (work, short, long)\n\
         \x20 ok               完了通知を閉じる\n\
         \x20 status           ステータス表示\n\
         \x20 help (?)         このヘルプ\n\
         \x20 quit (q)         終了"
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }
}

// ============================================================================
// LineState
// ============================================================================

/// Whether the cursor sits on an unterminated tick line.
///
/// Shared by every writer of the terminal, so that output from outside the
/// renderer starts on a fresh line.
#[derive(Debug, Clone, Default)]
pub struct LineState(Arc<AtomicBool>);

impl LineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn open(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Ends the open tick line on `out`, if there is one.
    pub fn finish(&self, out: &mut impl Write) -> std::io::Result<()> {
        if self.0.swap(false, Ordering::SeqCst) {
            writeln!(out)?;
        }
        Ok(())
    }
}

// ============================================================================
// TerminalRenderer
// ============================================================================

/// Renders engine updates as text.
///
/// Ticks redraw the current line in place; every other event ends the line
/// and prints a fresh status line.
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    show_emoji: bool,
    width: u16,
    line: LineState,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, show_emoji: bool, width: u16) -> Self {
        Self::with_line_state(out, show_emoji, width, LineState::new())
    }

    /// Creates a renderer that shares `line` with other terminal output.
    pub fn with_line_state(out: W, show_emoji: bool, width: u16, line: LineState) -> Self {
        Self {
            out,
            show_emoji,
            width,
            line,
        }
    }

    pub fn line_state(&self) -> LineState {
        self.line.clone()
    }

    /// Consumes the renderer and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, update: &TimerUpdate) -> std::io::Result<()> {
        let line = Display::format_status_line(&update.snapshot, self.show_emoji, self.width);

        match &update.event {
            TimerEvent::Tick { .. } => {
                write!(self.out, "\r{}", line)?;
                self.line.open();
            }
            TimerEvent::Completed { mode } => {
                self.line.finish(&mut self.out)?;
                writeln!(self.out, "{}", Display::format_completion(*mode))?;
            }
            _ => {
                self.line.finish(&mut self.out)?;
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> StateObserver for TerminalRenderer<W> {
    fn notify(&mut self, update: &TimerUpdate) {
        if let Err(e) = self.render(update) {
            tracing::warn!("Failed to render timer update: {}", e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
