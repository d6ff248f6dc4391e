//! The human-input boundary.
//!
//! When the oracle decides a human must answer, the controller asks
//! through this trait. The input kind is a capability parameter so any
//! front end (terminal, web form, headless test harness) can implement
//! masking and confirmation its own way.

use std::collections::VecDeque;

use tiller_types::{InputKind, TillerError};

/// Collects one answer from a human.
pub trait HumanInput: Send {
    /// Ask for input with the oracle's message. `default` is a suggested
    /// answer the front end may offer. The returned string carries no
    /// line terminator; the controller trims before forwarding.
    ///
    /// `InputKind::Password` obliges the implementation to suppress echo.
    fn request(
        &mut self,
        message: &str,
        kind: InputKind,
        default: Option<&str>,
    ) -> Result<String, TillerError>;
}

/// Canned answers for tests and headless replays.
///
/// Pops one response per request and records what was asked.
pub struct ScriptedHuman {
    responses: VecDeque<String>,
    requests: Vec<(String, InputKind)>,
}

impl ScriptedHuman {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            requests: Vec::new(),
        }
    }

    /// The `(message, kind)` pairs requested so far.
    pub fn requests(&self) -> &[(String, InputKind)] {
        &self.requests
    }
}

impl HumanInput for ScriptedHuman {
    fn request(
        &mut self,
        message: &str,
        kind: InputKind,
        _default: Option<&str>,
    ) -> Result<String, TillerError> {
        self.requests.push((message.to_string(), kind));
        self.responses
            .pop_front()
            .ok_or_else(|| TillerError::Human("scripted responses exhausted".into()))
    }
}
