//! Regex-rule decision oracle.
//!
//! Matches the buffer snapshot against user-configured patterns in order;
//! the first match wins. No match means the output is not actionable yet,
//! which is a wait.

use regex::Regex;

use tiller_types::{Decision, RuleConfig, TillerError};

use crate::oracle::DecisionOracle;

/// A compiled pattern with its validated decision.
struct CompiledRule {
    regex: Regex,
    decision: Decision,
}

/// Rule-driven oracle configurable via [`RuleConfig`] entries.
pub struct RulesOracle {
    rules: Vec<CompiledRule>,
}

impl RulesOracle {
    /// Compile the configured rules.
    ///
    /// Rules with an invalid pattern or an invalid decision are logged and
    /// skipped rather than causing a panic.
    pub fn new(configs: &[RuleConfig]) -> Self {
        let rules = configs
            .iter()
            .filter_map(|c| {
                let regex = match Regex::new(&c.pattern) {
                    Ok(regex) => regex,
                    Err(e) => {
                        tracing::warn!("skipping rule with invalid pattern {:?}: {e}", c.pattern);
                        return None;
                    }
                };
                let decision = match Decision::try_from(c.decision.clone()) {
                    Ok(decision) => decision,
                    Err(e) => {
                        tracing::warn!("skipping rule {:?} with invalid decision: {e}", c.pattern);
                        return None;
                    }
                };
                Some(CompiledRule { regex, decision })
            })
            .collect();

        Self { rules }
    }

    /// Number of rules that survived compilation.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl DecisionOracle for RulesOracle {
    fn name(&self) -> &str {
        "rules"
    }

    fn decide(&mut self, transcript: &str) -> Result<Decision, TillerError> {
        for rule in &self.rules {
            if rule.regex.is_match(transcript) {
                return Ok(rule.decision.clone());
            }
        }
        Ok(Decision::Wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_types::{InputKind, RawDecision};

    fn rule(pattern: &str, raw: RawDecision) -> RuleConfig {
        RuleConfig {
            pattern: pattern.into(),
            decision: raw,
        }
    }

    fn send_input(pattern: &str, input: &str) -> RuleConfig {
        rule(
            pattern,
            RawDecision {
                action: "send_input".into(),
                suggested_input: Some(input.into()),
                ..RawDecision::default()
            },
        )
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut oracle = RulesOracle::new(&[
            send_input(r"\[y/n\]", "y"),
            send_input(r"Continue", "never reached"),
        ]);

        match oracle.decide("Continue? [y/n]").unwrap() {
            Decision::SendInput { input } => assert_eq!(input, "y"),
            other => panic!("expected SendInput, got {other:?}"),
        }
    }

    #[test]
    fn no_match_is_a_wait() {
        let mut oracle = RulesOracle::new(&[send_input(r"\[y/n\]", "y")]);
        assert_eq!(oracle.decide("compiling crate 3 of 7...").unwrap(), Decision::Wait);
    }

    #[test]
    fn prompt_rules_carry_input_kind() {
        let mut oracle = RulesOracle::new(&[rule(
            r"(?i)password:",
            RawDecision {
                action: "prompt_user".into(),
                message: Some("Enter the password".into()),
                input_kind: Some(InputKind::Password),
                ..RawDecision::default()
            },
        )]);

        match oracle.decide("login\nPassword: ").unwrap() {
            Decision::PromptUser {
                message,
                input_kind,
                ..
            } => {
                assert_eq!(message, "Enter the password");
                assert_eq!(input_kind, InputKind::Password);
            }
            other => panic!("expected PromptUser, got {other:?}"),
        }
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let oracle = RulesOracle::new(&[
            send_input(r"([unclosed", "x"),
            send_input(r"ok", "y"),
        ]);
        assert_eq!(oracle.len(), 1);
    }

    #[test]
    fn invalid_decision_is_skipped() {
        let oracle = RulesOracle::new(&[
            // send_input with no suggested_input violates the contract
            rule(
                "whatever",
                RawDecision {
                    action: "send_input".into(),
                    ..RawDecision::default()
                },
            ),
        ]);
        assert!(oracle.is_empty());
    }

    #[test]
    fn empty_rule_set_always_waits() {
        let mut oracle = RulesOracle::new(&[]);
        assert_eq!(oracle.decide("anything at all").unwrap(), Decision::Wait);
    }
}
