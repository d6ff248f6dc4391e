//! Error types shared across the tiller crates.

/// Errors that can occur while supervising an interactive session.
///
/// Read/write-layer failures (`Spawn`, `Pty`, `Write`) are fatal to the
/// session. Oracle-layer failures (`Oracle`, `InvalidDecision`) are
/// recoverable; the controller degrades them to a wait and escalates only
/// after repeated consecutive failures.
#[derive(Debug, thiserror::Error)]
pub enum TillerError {
    #[error("failed to spawn child process: {0}")]
    Spawn(String),

    #[error("pty error: {0}")]
    Pty(String),

    #[error("write to child failed: {0}")]
    Write(String),

    #[error("decision oracle error: {0}")]
    Oracle(String),

    #[error("invalid decision from oracle: {0}")]
    InvalidDecision(String),

    #[error("human input error: {0}")]
    Human(String),

    #[error("configuration error: {0}")]
    Config(String),
}
