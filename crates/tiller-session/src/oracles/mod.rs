//! Built-in decision oracle implementations.

pub mod llm;
pub mod rules;
pub mod scripted;

pub use llm::LlmOracle;
pub use rules::RulesOracle;
pub use scripted::ScriptedOracle;

use tiller_types::{OracleConfig, OracleKind, TillerError};

use crate::oracle::DecisionOracle;

/// Build the oracle selected by the configuration.
pub fn create(config: &OracleConfig) -> Result<Box<dyn DecisionOracle>, TillerError> {
    match config.kind {
        OracleKind::Rules => Ok(Box::new(RulesOracle::new(&config.rules))),
        OracleKind::Llm => Ok(Box::new(LlmOracle::new(&config.llm)?)),
    }
}
