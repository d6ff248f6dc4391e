//! Core types shared across the tiller crates.
//!
//! Defines decisions, session lifecycle state, configuration, and error
//! types used by the session controller, the built-in oracles, and the CLI.

pub mod config;
pub mod decision;
pub mod error;
pub mod session;

pub use config::{
    ControllerConfig, LlmConfig, LlmProvider, OracleConfig, OracleKind, RuleConfig, TillerConfig,
    ANTHROPIC_API_KEY_ENV, CONFIG_FILENAME, DEFAULT_ANTHROPIC_MODEL, DEFAULT_OPENAI_MODEL,
    OPENAI_API_KEY_ENV,
};
pub use decision::{Decision, InputKind, RawDecision};
pub use error::TillerError;
pub use session::{SessionReport, SessionState, SessionStats};
