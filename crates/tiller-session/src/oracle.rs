//! The decision-oracle boundary.
//!
//! An oracle turns accumulated session output into a structured decision.
//! The controller makes no assumption about how the decision is computed --
//! regex rules, a remote model, or a scripted replay all satisfy the same
//! trait, which is what makes the control loop testable deterministically.

use tiller_types::{Decision, TillerError};

/// Turns a buffered output snapshot into a [`Decision`].
///
/// Implementations may be stateful (e.g. keeping conversation history) and
/// are only ever consulted on a non-blank snapshot, at most once per loop
/// iteration. Failures are recoverable: the controller degrades them to a
/// wait and escalates only after repeated consecutive failures.
pub trait DecisionOracle: Send {
    /// Human-readable name for logs (e.g. "rules", "llm").
    fn name(&self) -> &str;

    /// Decide what to do with the output accumulated since the last
    /// resolved decision. `transcript` is ANSI-stripped and may end in a
    /// partial line -- prompts rarely end with a newline.
    fn decide(&mut self, transcript: &str) -> Result<Decision, TillerError>;
}
