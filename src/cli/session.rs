//! Interactive timer session.
//!
//! Reads one command per line and applies it to a [`SharedTimer`]. Engine
//! updates reach the terminal through the renderer subscribed to the timer.

use std::future::Future;
use std::io::{self, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use super::display::{Display, LineState};
use crate::engine::SharedTimer;
use crate::types::{Mode, ParseModeError};

// ============================================================================
// SessionCommand
// ============================================================================

/// A command typed into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    /// Pause when running, start otherwise
    Toggle,
    Reset,
    Mode(Mode),
    /// Dismiss the completion notification
    Acknowledge,
    Status,
    Help,
    Quit,
}

/// Errors from parsing a session command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("コマンドが空です")]
    Empty,

    #[error("不明なコマンドです: '{0}' ('help' でコマンド一覧を表示)")]
    Unknown(String),

    #[error("モードを指定してください (work, short, long)")]
    MissingMode,

    #[error(transparent)]
    InvalidMode(#[from] ParseModeError),

    #[error("コマンド '{0}' は引数を取りません")]
    UnexpectedArgument(String),
}

impl FromStr for SessionCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let arg = words.next();

        let command = match name.as_str() {
            "mode" | "m" => {
                let mode = arg.ok_or(CommandError::MissingMode)?.parse::<Mode>()?;
                if words.next().is_some() {
                    return Err(CommandError::UnexpectedArgument(name));
                }
                return Ok(SessionCommand::Mode(mode));
            }
            "start" | "s" => SessionCommand::Start,
            "pause" | "p" => SessionCommand::Pause,
            "toggle" | "t" => SessionCommand::Toggle,
            "reset" | "r" => SessionCommand::Reset,
            "ok" | "dismiss" => SessionCommand::Acknowledge,
            "status" => SessionCommand::Status,
            "help" | "?" => SessionCommand::Help,
            "quit" | "q" | "exit" => SessionCommand::Quit,
            _ => return Err(CommandError::Unknown(name)),
        };

        if arg.is_some() {
            return Err(CommandError::UnexpectedArgument(name));
        }
        Ok(command)
    }
}

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// Session
// ============================================================================

/// Interactive session bound to one timer.
///
/// Session output shares a [`LineState`] with the renderer, so it never
/// lands on the end of a tick line.
pub struct Session<W: Write = io::Stdout> {
    timer: SharedTimer,
    out: W,
    line: LineState,
}

impl Session {
    /// Creates a session writing to stdout.
    pub fn new(timer: SharedTimer, line: LineState) -> Self {
        Self::with_writer(timer, io::stdout(), line)
    }
}

impl<W: Write> Session<W> {
    pub fn with_writer(timer: SharedTimer, out: W, line: LineState) -> Self {
        Self { timer, out, line }
    }

    pub fn timer(&self) -> &SharedTimer {
        &self.timer
    }

    /// Consumes the session and returns the writer.
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Applies one command to the timer.
    ///
    /// Starting needs a tokio runtime for the countdown task; outside one the
    /// timer stays idle.
    pub fn apply(&mut self, command: SessionCommand) -> Flow {
        debug!(?command, "Applying session command");

        match command {
            SessionCommand::Start => self.start(),
            SessionCommand::Pause => {
                if !self.timer.pause() {
                    self.say("タイマーは実行されていません");
                }
            }
            SessionCommand::Toggle => {
                if !self.timer.pause() {
                    self.start();
                }
            }
            SessionCommand::Reset => self.timer.reset(),
            SessionCommand::Mode(mode) => self.timer.set_mode(mode),
            SessionCommand::Acknowledge => {
                if !self.timer.acknowledge_completion() {
                    self.say("閉じる通知はありません");
                }
            }
            SessionCommand::Status => {
                let status = Display::format_status(&self.timer.snapshot());
                self.say(&status);
            }
            SessionCommand::Help => self.say(Display::format_help()),
            SessionCommand::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    fn start(&mut self) {
        if self.timer.start() {
            return;
        }
        let snapshot = self.timer.snapshot();
        if snapshot.is_complete {
            self.say("完了通知を閉じてから開始してください ('ok')");
        } else if snapshot.is_active {
            self.say("タイマーは既に実行中です");
        } else {
            self.say("タイマーを開始できませんでした");
        }
    }

    /// Writes one message, ending an open tick line first.
    fn say(&mut self, message: &str) {
        let result = self
            .line
            .finish(&mut self.out)
            .and_then(|()| writeln!(self.out, "{}", message))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to write session output: {}", e);
        }
    }

    fn report_error(&mut self, message: &str) {
        if let Err(e) = self.line.finish(&mut self.out).and_then(|()| self.out.flush()) {
            warn!("Failed to write session output: {}", e);
        }
        Display::show_error(message);
    }

    /// Reads commands from `input` until it ends, `quit` is entered, or
    /// `shutdown` resolves.
    pub async fn run_until<R, F>(&mut self, input: R, shutdown: F) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        F: Future,
    {
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("入力の読み込みに失敗しました")? else {
                        info!("Input closed, ending session");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<SessionCommand>() {
                        Ok(command) => {
                            if self.apply(command) == Flow::Quit {
                                info!("Quit requested, ending session");
                                break;
                            }
                        }
                        Err(e) => self.report_error(&e.to_string()),
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, ending session");
                    break;
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimerPhase;

    // ------------------------------------------------------------------------
    // Parse Tests
    // ------------------------------------------------------------------------

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_simple_commands() {
            assert_eq!("start".parse::<SessionCommand>(), Ok(SessionCommand::Start));
            assert_eq!("s".parse::<SessionCommand>(), Ok(SessionCommand::Start));
            assert_eq!("PAUSE".parse::<SessionCommand>(), Ok(SessionCommand::Pause));
            assert_eq!("t".parse::<SessionCommand>(), Ok(SessionCommand::Toggle));
            assert_eq!(" reset ".parse::<SessionCommand>(), Ok(SessionCommand::Reset));
            assert_eq!("ok".parse::<SessionCommand>(), Ok(SessionCommand::Acknowledge));
            assert_eq!("dismiss".parse::<SessionCommand>(), Ok(SessionCommand::Acknowledge));
            assert_eq!("status".parse::<SessionCommand>(), Ok(SessionCommand::Status));
            assert_eq!("?".parse::<SessionCommand>(), Ok(SessionCommand::Help));
            assert_eq!("exit".parse::<SessionCommand>(), Ok(SessionCommand::Quit));
        }

        #[test]
        fn test_parse_mode_command() {
            assert_eq!(
                "mode short".parse::<SessionCommand>(),
                Ok(SessionCommand::Mode(Mode::ShortBreak))
            );
            assert_eq!(
                "m long-break".parse::<SessionCommand>(),
                Ok(SessionCommand::Mode(Mode::LongBreak))
            );
        }

        #[test]
        fn test_parse_errors() {
            assert_eq!("".parse::<SessionCommand>(), Err(CommandError::Empty));
            assert_eq!(
                "launch".parse::<SessionCommand>(),
                Err(CommandError::Unknown("launch".to_string()))
            );
            assert_eq!(
                "mode".parse::<SessionCommand>(),
                Err(CommandError::MissingMode)
            );
            assert_eq!(
                "mode nap".parse::<SessionCommand>(),
                Err(CommandError::InvalidMode(ParseModeError("nap".to_string())))
            );
            assert_eq!(
                "start now".parse::<SessionCommand>(),
                Err(CommandError::UnexpectedArgument("start".to_string()))
            );
            assert_eq!(
                "mode work now".parse::<SessionCommand>(),
                Err(CommandError::UnexpectedArgument("mode".to_string()))
            );
        }
    }

    // ------------------------------------------------------------------------
    // Session Tests
    // ------------------------------------------------------------------------

    mod session_tests {
        use super::*;
        use crate::cli::display::TerminalRenderer;
        use std::sync::{Arc, Mutex};
        use tokio::time::{sleep, Duration};

        /// Writer shared by the renderer and the session, like stdout.
        #[derive(Clone, Default)]
        struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

        impl Write for SharedBuffer {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl SharedBuffer {
            fn contents(&self) -> String {
                String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
            }
        }

        fn session(mode: Mode) -> Session<Vec<u8>> {
            Session::with_writer(SharedTimer::new(mode), Vec::new(), LineState::new())
        }

        fn output(session: Session<Vec<u8>>) -> String {
            String::from_utf8(session.into_writer()).unwrap()
        }

        #[tokio::test(start_paused = true)]
        async fn test_apply_controls() {
            let mut session = session(Mode::Work);

            assert_eq!(session.apply(SessionCommand::Start), Flow::Continue);
            sleep(Duration::from_millis(2500)).await;
            session.apply(SessionCommand::Pause);

            let snapshot = session.timer().snapshot();
            assert_eq!(snapshot.remaining_seconds, 1498);
            assert_eq!(snapshot.phase, TimerPhase::Idle);

            session.apply(SessionCommand::Toggle);
            assert!(session.timer().snapshot().is_active);
            session.apply(SessionCommand::Toggle);
            assert!(!session.timer().snapshot().is_active);

            session.apply(SessionCommand::Mode(Mode::LongBreak));
            assert_eq!(session.timer().snapshot().remaining_seconds, 900);

            assert_eq!(session.apply(SessionCommand::Quit), Flow::Quit);
        }

        #[tokio::test(start_paused = true)]
        async fn test_acknowledge_after_completion() {
            let mut session = session(Mode::ShortBreak);

            session.apply(SessionCommand::Start);
            sleep(Duration::from_secs(301)).await;
            assert!(session.timer().snapshot().is_complete);

            session.apply(SessionCommand::Start);
            assert!(session.timer().snapshot().is_complete);

            session.apply(SessionCommand::Acknowledge);
            let snapshot = session.timer().snapshot();
            assert!(!snapshot.is_complete);
            assert_eq!(snapshot.remaining_seconds, 300);

            let text = output(session);
            assert!(text.contains("完了通知を閉じてから開始してください"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_notices_for_out_of_state_commands() {
            let mut session = session(Mode::Work);

            session.apply(SessionCommand::Pause);
            session.apply(SessionCommand::Acknowledge);
            session.apply(SessionCommand::Start);
            session.apply(SessionCommand::Start);

            let text = output(session);
            assert!(text.contains("タイマーは実行されていません\n"));
            assert!(text.contains("閉じる通知はありません\n"));
            assert!(text.contains("タイマーは既に実行中です\n"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_status_while_running_starts_on_fresh_line() {
            let buffer = SharedBuffer::default();
            let timer = SharedTimer::new(Mode::Work);
            let renderer = TerminalRenderer::new(buffer.clone(), true, 5);
            let line = renderer.line_state();
            timer.subscribe(renderer);
            let mut session = Session::with_writer(timer, buffer.clone(), line.clone());

            session.apply(SessionCommand::Start);
            sleep(Duration::from_millis(2300)).await;
            assert!(line.is_open());

            session.apply(SessionCommand::Status);
            assert!(!line.is_open());

            let text = buffer.contents();
            let lines: Vec<&str> = text.split('\n').collect();
            assert!(lines.iter().any(|l| *l == "フォーカスタイマー ステータス"));
            assert!(lines
                .iter()
                .all(|l| !l.contains("実行中フォーカスタイマー")));
            assert!(text.contains("残り時間: 24:58"));
        }

        #[test]
        fn test_start_outside_runtime_reports_failure() {
            let mut session = session(Mode::Work);

            session.apply(SessionCommand::Start);

            assert!(!session.timer().snapshot().is_active);
            assert!(output(session).contains("タイマーを開始できませんでした"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_until_processes_script() {
            let mut session = session(Mode::Work);
            let script: &[u8] = b"mode short\n\nbogus\nstart\nquit\nreset\n";

            session
                .run_until(script, std::future::pending::<()>())
                .await
                .unwrap();

            // `reset` after `quit` is never applied.
            let snapshot = session.timer().snapshot();
            assert_eq!(snapshot.mode, Mode::ShortBreak);
            assert!(snapshot.is_active);
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_until_stops_on_shutdown() {
            let mut session = session(Mode::Work);
            let (_tx, rx) = tokio::io::duplex(64);
            let input = tokio::io::BufReader::new(rx);

            session
                .run_until(input, sleep(Duration::from_secs(1)))
                .await
                .unwrap();

            assert_eq!(session.timer().snapshot().remaining_seconds, 1500);
        }
    }
}
