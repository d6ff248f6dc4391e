//! The session control loop.
//!
//! Pulls output from the PTY into the buffer, consults the decision oracle
//! when the buffer holds something, and executes the resulting action:
//! answer the child directly, collect an answer from a human, report an
//! error, or keep waiting. One read, at most one decision, at most one
//! write per iteration, in that strict order, so nothing races against the
//! child.
//!
//! The controller talks to the outside through two optional channels:
//! - `event_tx`: [`SessionEvent`] for the operator console and logging
//! - `command_rx`: [`ControllerCommand`] for cancellation and input injection

use std::io::Write as _;
use std::sync::mpsc;

use tracing::{debug, error, info, warn};

use tiller_types::{
    ControllerConfig, Decision, SessionReport, SessionStats, TillerError,
};

use crate::buffer::OutputBuffer;
use crate::human::HumanInput;
use crate::oracle::DecisionOracle;
use crate::pty::{PtySession, ReadEvent};
use crate::stall::WaitTracker;

/// Events emitted for external consumers (operator console, logging).
///
/// `HumanResponded` carries the oracle's message, never the human's
/// answer -- the answer may be a secret.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The oracle answered the child without human involvement.
    AutoResponded { input: String },
    /// A human was prompted and their answer forwarded to the child.
    HumanResponded { message: String },
    /// The oracle flagged a problem; the session keeps running.
    ErrorReported { message: String },
    /// The oracle keeps deferring on unresolved output.
    StallWarning { consecutive_waits: u32 },
    /// An oracle call failed.
    OracleFailed { error: String, consecutive: u32 },
    /// The oracle produced a decision that violates its contract.
    InvalidDecision { reason: String },
    /// The child reached EOF.
    Completed { exit_code: i32 },
    /// The session was cancelled from outside.
    Cancelled,
    /// The session ended in failure.
    Failed { reason: String },
}

/// Commands accepted by a running controller.
///
/// Observed between loop iterations, never mid-read.
#[derive(Debug)]
pub enum ControllerCommand {
    /// Terminate the child and end the session as cancelled.
    Cancel,
    /// Inject a line of operator input into the child.
    SendInput { text: String },
}

/// Run the controller until the child exits, the session fails, or it is
/// cancelled.
///
/// Every exit path reports a human-readable reason (via the returned
/// [`SessionReport`] and the event channel) and releases the child: hard
/// read/write failures terminate it before returning, and the
/// [`PtySession`] destructor covers the rest.
pub fn run(
    pty: &PtySession,
    oracle: &mut dyn DecisionOracle,
    human: &mut dyn HumanInput,
    config: &ControllerConfig,
    event_tx: Option<&mpsc::Sender<SessionEvent>>,
    command_rx: Option<&mpsc::Receiver<ControllerCommand>>,
) -> SessionReport {
    let mut stats = SessionStats::default();
    match run_loop(pty, oracle, human, config, event_tx, command_rx, &mut stats) {
        Ok(report) => report,
        Err(e) => {
            // Read/write-layer failure: fatal. Make sure the child is gone.
            let reason = e.to_string();
            error!(error = %reason, "session failed");
            let _ = pty.terminate();
            emit(event_tx, SessionEvent::Failed {
                reason: reason.clone(),
            });
            SessionReport::failed(reason, stats)
        }
    }
}

fn run_loop(
    pty: &PtySession,
    oracle: &mut dyn DecisionOracle,
    human: &mut dyn HumanInput,
    config: &ControllerConfig,
    event_tx: Option<&mpsc::Sender<SessionEvent>>,
    command_rx: Option<&mpsc::Receiver<ControllerCommand>>,
    stats: &mut SessionStats,
) -> Result<SessionReport, TillerError> {
    let mut buffer = OutputBuffer::new(config.max_transcript_bytes);
    let mut waits = WaitTracker::new(config.max_consecutive_waits);
    let mut oracle_failures = 0u32;

    info!(oracle = oracle.name(), pid = pty.pid(), "session controller started");

    loop {
        // Cancellation and operator commands, between iterations only.
        if let Some(rx) = command_rx {
            while let Ok(cmd) = rx.try_recv() {
                match cmd {
                    ControllerCommand::Cancel => {
                        info!("cancellation requested");
                        pty.terminate()?;
                        emit(event_tx, SessionEvent::Cancelled);
                        return Ok(SessionReport::cancelled(
                            "cancelled by operator",
                            stats.clone(),
                        ));
                    }
                    ControllerCommand::SendInput { text } => {
                        pty.write_line(&text)?;
                        waits.reset();
                        info!(text, "operator input sent to child");
                    }
                }
            }
        }

        match pty.read_available(config.poll_timeout_ms)? {
            ReadEvent::Data(chunk) => {
                if config.echo_output {
                    let mut stdout = std::io::stdout();
                    let _ = stdout.write_all(&chunk);
                    let _ = stdout.flush();
                }
                buffer.append(&chunk);
            }
            // A timeout is a normal iteration; content already buffered
            // from earlier reads still gets a decision below.
            ReadEvent::Timeout => {}
            ReadEvent::Eof => {
                if !buffer.is_empty() {
                    debug!(bytes = buffer.len(), "discarding unresolved output at EOF");
                }
                let exit_code = pty.wait()?;
                info!(exit_code, "child process exited");
                emit(event_tx, SessionEvent::Completed { exit_code });
                return Ok(SessionReport::completed(exit_code, stats.clone()));
            }
        }

        // Pure timeouts with nothing buffered never reach the oracle.
        if buffer.is_blank() {
            continue;
        }

        let decision = match oracle.decide(&buffer.snapshot()) {
            Ok(decision) => {
                oracle_failures = 0;
                decision
            }
            Err(TillerError::InvalidDecision(reason)) => {
                // Contract violation: nothing is forwarded to the child.
                // The oracle is responsive, just wrong, so this does not
                // count against its availability.
                warn!(%reason, "oracle returned an invalid decision, treating as wait");
                stats.invalid_decisions += 1;
                emit(event_tx, SessionEvent::InvalidDecision { reason });
                record_wait(&mut waits, stats, event_tx);
                continue;
            }
            Err(e) => {
                oracle_failures += 1;
                stats.oracle_failures += 1;
                warn!(error = %e, consecutive = oracle_failures, "oracle call failed");
                emit(event_tx, SessionEvent::OracleFailed {
                    error: e.to_string(),
                    consecutive: oracle_failures,
                });
                if oracle_failures >= config.max_oracle_failures {
                    let reason =
                        format!("oracle failed {oracle_failures} times in a row: {e}");
                    error!(%reason, "session failed");
                    pty.terminate()?;
                    emit(event_tx, SessionEvent::Failed {
                        reason: reason.clone(),
                    });
                    return Ok(SessionReport::failed(reason, stats.clone()));
                }
                // Implicit wait: buffer retained for the next attempt.
                continue;
            }
        };

        stats.decisions += 1;
        debug!(action = decision.action_name(), "oracle decided");

        if let Err(e) = decision.validate() {
            let reason = e.to_string();
            warn!(%reason, "decision failed validation, treating as wait");
            stats.invalid_decisions += 1;
            emit(event_tx, SessionEvent::InvalidDecision { reason });
            record_wait(&mut waits, stats, event_tx);
            continue;
        }

        match decision {
            // Wait leaves the buffer intact: a partial prompt keeps
            // accumulating until a later decision resolves it.
            Decision::Wait => {
                record_wait(&mut waits, stats, event_tx);
            }
            Decision::PromptUser {
                message,
                input_kind,
                suggested_input,
            } => {
                let response = human.request(&message, input_kind, suggested_input.as_deref())?;
                pty.write_line(response.trim())?;
                stats.human_prompts += 1;
                emit(event_tx, SessionEvent::HumanResponded { message });
                buffer.clear();
                waits.reset();
            }
            Decision::SendInput { input } => {
                pty.write_line(&input)?;
                stats.auto_responses += 1;
                info!(input = %input, "auto-responded to child");
                emit(event_tx, SessionEvent::AutoResponded { input });
                buffer.clear();
                waits.reset();
            }
            Decision::Error { message } => {
                error!(message = %message, "oracle reported an error");
                stats.errors_reported += 1;
                emit(event_tx, SessionEvent::ErrorReported { message });
                buffer.clear();
                waits.reset();
            }
        }
    }
}

fn record_wait(
    waits: &mut WaitTracker,
    stats: &mut SessionStats,
    event_tx: Option<&mpsc::Sender<SessionEvent>>,
) {
    if waits.record() {
        let consecutive_waits = waits.count();
        warn!(consecutive_waits, "session appears stalled on unresolved output");
        stats.stall_warnings += 1;
        emit(event_tx, SessionEvent::StallWarning { consecutive_waits });
    }
}

fn emit(tx: Option<&mpsc::Sender<SessionEvent>>, event: SessionEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}
