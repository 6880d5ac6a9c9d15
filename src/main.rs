//! Focus Timer CLI
//!
//! A single-screen countdown with three presets:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::BufReader;
use tracing::info;

use focus_timer::cli::{Cli, Commands, Display, RunArgs, Session, TerminalRenderer};
use focus_timer::config::TimerConfig;
use focus_timer::engine::SharedTimer;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    // Exit explicitly: a blocked stdin read would otherwise hold the runtime
    // open after ctrl-c.
    match execute(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            Display::show_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr; stdout belongs to the renderer.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run(args).await?,
        Some(Commands::Modes { json }) => {
            if json {
                println!("{}", Display::format_modes_json()?);
            } else {
                Display::show_modes();
            }
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Runs an interactive timer session on stdin/stdout.
async fn run(args: RunArgs) -> Result<()> {
    let config = TimerConfig::load(args.config.as_deref()).context("設定の読み込みに失敗しました")?;
    let config = args.apply(config);
    info!(?config, "Starting session");

    let timer = SharedTimer::new(config.initial_mode);
    let initial = timer.snapshot();
    println!(
        "{}",
        Display::format_status_line(&initial, config.show_emoji, config.progress_bar_width)
    );
    println!("'help' でコマンド一覧を表示します");

    let renderer = TerminalRenderer::new(
        std::io::stdout(),
        config.show_emoji,
        config.progress_bar_width,
    );
    let line = renderer.line_state();
    timer.subscribe(renderer);
    if config.auto_start {
        timer.start();
    }

    let mut session = Session::new(timer, line.clone());
    session
        .run_until(BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c())
        .await?;

    line.finish(&mut std::io::stdout())?;
    println!("👋 セッションを終了しました");
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
