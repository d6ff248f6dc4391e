//! Run a command under tiller supervision.
//!
//! `tiller run [--config PATH] [--oracle rules|llm] -- command [args...]`
//!
//! Spawns the command in a PTY, wires Ctrl-C to cooperative cancellation,
//! prints session events to stderr, and exits with the child's exit code
//! (1 on failure, 130 on cancellation).

use std::path::Path;
use std::sync::mpsc;

use anyhow::{bail, Context, Result};
use tracing::info;

use tiller_session::controller::{self, ControllerCommand, SessionEvent};
use tiller_session::oracles;
use tiller_session::pty::PtySession;
use tiller_types::{OracleKind, SessionState, TillerConfig, CONFIG_FILENAME};

use crate::prompts::TerminalHuman;

pub fn run(
    config_path: Option<&Path>,
    oracle_override: Option<&str>,
    model_override: Option<&str>,
    quiet: bool,
    command: &[String],
) -> Result<i32> {
    let mut config = load_config(config_path)?;

    if let Some(kind) = oracle_override {
        config.oracle.kind = match kind {
            "rules" => OracleKind::Rules,
            "llm" => OracleKind::Llm,
            other => bail!("unknown oracle {other:?} (expected \"rules\" or \"llm\")"),
        };
    }
    if let Some(model) = model_override {
        config.oracle.llm.model = model.to_string();
    }
    if quiet {
        config.controller.echo_output = false;
    }

    let (program, args) = command
        .split_first()
        .context("no command given")?;

    let mut oracle = oracles::create(&config.oracle)?;
    let mut human = TerminalHuman;

    let pty = PtySession::spawn(program, args)?;
    info!(command = %program, pid = pty.pid(), "session started");

    // Print events as they happen; the printer thread ends when the
    // controller drops its sender.
    let (event_tx, event_rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in event_rx {
            print_event(&event);
        }
    });

    // Ctrl-C requests cooperative cancellation; the controller observes it
    // between iterations and tears the child down.
    let (command_tx, command_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = command_tx.send(ControllerCommand::Cancel);
    })
    .context("failed to install Ctrl-C handler")?;

    let report = controller::run(
        &pty,
        oracle.as_mut(),
        &mut human,
        &config.controller,
        Some(&event_tx),
        Some(&command_rx),
    );

    drop(event_tx);
    let _ = printer.join();

    match report.state {
        SessionState::Completed => Ok(report.exit_code.unwrap_or(0)),
        SessionState::Cancelled => Ok(130),
        SessionState::Failed | SessionState::Running => {
            eprintln!(
                "tiller: session failed: {}",
                report.reason.as_deref().unwrap_or("unknown reason")
            );
            Ok(1)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TillerConfig> {
    match path {
        Some(p) => TillerConfig::load(p)
            .with_context(|| format!("failed to load config from {}", p.display())),
        None => {
            let default = Path::new(CONFIG_FILENAME);
            if default.exists() {
                TillerConfig::load(default)
                    .with_context(|| format!("failed to load {CONFIG_FILENAME}"))
            } else {
                Ok(TillerConfig::default())
            }
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::AutoResponded { input } => {
            eprintln!("\n[tiller] auto-responded: {input}");
        }
        SessionEvent::HumanResponded { message } => {
            eprintln!("[tiller] answer forwarded to the session ({message})");
        }
        SessionEvent::ErrorReported { message } => {
            eprintln!("\n[tiller] error detected: {message}");
        }
        SessionEvent::StallWarning { consecutive_waits } => {
            eprintln!(
                "\n[tiller] session appears stalled ({consecutive_waits} checks without progress)"
            );
        }
        SessionEvent::OracleFailed { error, consecutive } => {
            eprintln!("\n[tiller] oracle failure #{consecutive}: {error}");
        }
        SessionEvent::InvalidDecision { reason } => {
            eprintln!("\n[tiller] ignored invalid decision: {reason}");
        }
        SessionEvent::Completed { exit_code } => {
            eprintln!("\n[tiller] command completed (exit code {exit_code})");
        }
        SessionEvent::Cancelled => {
            eprintln!("\n[tiller] session cancelled");
        }
        SessionEvent::Failed { reason } => {
            eprintln!("\n[tiller] session failed: {reason}");
        }
    }
}
