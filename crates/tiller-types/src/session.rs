//! Session lifecycle state and run statistics.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one supervised session.
///
/// Terminal states are final; a session is never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// The control loop is live.
    Running,
    /// The child reached EOF and was reaped.
    Completed,
    /// An unrecoverable error ended the session.
    Failed,
    /// An external cancellation request ended the session.
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Running)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Running => "running",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Counters collected while a session runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Decisions the oracle produced (including waits).
    pub decisions: u64,
    /// Inputs forwarded to the child without human involvement.
    pub auto_responses: u64,
    /// Times a human was prompted for input.
    pub human_prompts: u64,
    /// Error decisions surfaced to the operator.
    pub errors_reported: u64,
    /// Oracle calls that failed outright.
    pub oracle_failures: u64,
    /// Decisions rejected for violating the oracle contract.
    pub invalid_decisions: u64,
    /// Stall warnings reported.
    pub stall_warnings: u64,
}

/// Final report for a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub state: SessionState,
    /// Child exit code, when the child was reaped cleanly.
    pub exit_code: Option<i32>,
    /// Human-readable reason for `Failed` and `Cancelled` endings.
    pub reason: Option<String>,
    pub stats: SessionStats,
}

impl SessionReport {
    pub fn completed(exit_code: i32, stats: SessionStats) -> Self {
        Self {
            state: SessionState::Completed,
            exit_code: Some(exit_code),
            reason: None,
            stats,
        }
    }

    pub fn failed(reason: impl Into<String>, stats: SessionStats) -> Self {
        Self {
            state: SessionState::Failed,
            exit_code: None,
            reason: Some(reason.into()),
            stats,
        }
    }

    pub fn cancelled(reason: impl Into<String>, stats: SessionStats) -> Self {
        Self {
            state: SessionState::Cancelled,
            exit_code: None,
            reason: Some(reason.into()),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_default_to_zero() {
        let stats = SessionStats::default();
        assert_eq!(stats.decisions, 0);
        assert_eq!(stats.auto_responses, 0);
        assert_eq!(stats.human_prompts, 0);
        assert_eq!(stats.oracle_failures, 0);
        assert_eq!(stats.stall_warnings, 0);
    }

    #[test]
    fn terminal_states() {
        assert!(!SessionState::Running.is_terminal());
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
    }

    #[test]
    fn report_constructors() {
        let report = SessionReport::completed(0, SessionStats::default());
        assert_eq!(report.state, SessionState::Completed);
        assert_eq!(report.exit_code, Some(0));
        assert!(report.reason.is_none());

        let report = SessionReport::failed("oracle gave up", SessionStats::default());
        assert_eq!(report.state, SessionState::Failed);
        assert_eq!(report.reason.as_deref(), Some("oracle gave up"));

        let report = SessionReport::cancelled("operator interrupt", SessionStats::default());
        assert_eq!(report.state, SessionState::Cancelled);
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Completed.to_string(), "completed");
        assert_eq!(SessionState::Cancelled.to_string(), "cancelled");
    }
}
