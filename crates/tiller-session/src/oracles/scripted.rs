//! Scripted oracle for deterministic, replayable runs.
//!
//! Pops one canned result per call and records every transcript it was
//! shown, so tests can assert both what the controller asked and how often
//! it asked. When the script runs dry it answers with a wait, which keeps
//! replays deterministic past the scripted portion.

use std::collections::VecDeque;

use tiller_types::{Decision, TillerError};

use crate::oracle::DecisionOracle;

pub struct ScriptedOracle {
    script: VecDeque<Result<Decision, TillerError>>,
    transcripts: Vec<String>,
}

impl ScriptedOracle {
    pub fn new(script: Vec<Result<Decision, TillerError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            transcripts: Vec::new(),
        }
    }

    /// A script of plain decisions, no failures.
    pub fn from_decisions(decisions: Vec<Decision>) -> Self {
        Self::new(decisions.into_iter().map(Ok).collect())
    }

    /// How many times the oracle was consulted.
    pub fn calls(&self) -> usize {
        self.transcripts.len()
    }

    /// Every transcript the oracle was shown, in order.
    pub fn transcripts(&self) -> &[String] {
        &self.transcripts
    }
}

impl DecisionOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    fn decide(&mut self, transcript: &str) -> Result<Decision, TillerError> {
        self.transcripts.push(transcript.to_string());
        self.script.pop_front().unwrap_or(Ok(Decision::Wait))
    }
}
