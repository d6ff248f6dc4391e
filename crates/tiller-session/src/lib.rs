//! PTY-driven supervision of interactive terminal sessions.
//!
//! Spawns a command attached to a pseudo-terminal, accumulates its output,
//! and consults a pluggable decision oracle about what to do next: answer
//! the child automatically, collect an answer from a human, report an
//! error, or keep waiting for more output.
//!
//! # Architecture
//!
//! - [`pty::PtySession`]: child process attached to a pseudo-terminal
//! - [`buffer::OutputBuffer`]: output accumulated since the last decision
//! - [`oracle::DecisionOracle`]: trait turning buffered output into a decision
//! - [`oracles`]: built-in rule-based, remote-model, and scripted oracles
//! - [`human::HumanInput`]: boundary for collecting operator input
//! - [`stall::WaitTracker`]: consecutive-wait stall tracking
//! - [`controller`]: the read, decide, act loop

pub mod buffer;
pub mod controller;
pub mod human;
pub mod oracle;
pub mod oracles;
pub mod pty;
pub mod stall;
