//! The structured verdict an oracle produces for buffered session output.
//!
//! [`Decision`] is a tagged enum whose required fields are checked at
//! compile time. Loosely-shaped payloads (a model reply, a config rule)
//! arrive as [`RawDecision`] and are validated on conversion, so a decision
//! that reaches the controller can never be missing the data its action
//! needs.

use serde::{Deserialize, Serialize};

use crate::TillerError;

/// How a human's answer should be collected when the oracle asks for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Secret input; the front end must suppress echo.
    Password,
    /// A yes/no confirmation.
    YesNo,
    /// Free-form text.
    Text,
}

/// What to do with the output accumulated since the last decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Ask a human for input, then forward their (trimmed) answer to the child.
    PromptUser {
        /// Instruction shown to the human. Must be non-empty.
        message: String,
        /// How the answer should be collected.
        input_kind: InputKind,
        /// Optional default answer offered to the human.
        suggested_input: Option<String>,
    },
    /// Forward this input to the child with no human involvement.
    SendInput {
        /// The line written to the child's stdin.
        input: String,
    },
    /// Do nothing; let output keep accumulating.
    Wait,
    /// Surface a diagnostic to the operator. The session keeps running.
    Error {
        /// Description of the problem. Must be non-empty.
        message: String,
    },
}

impl Decision {
    /// Short action name for logs and events.
    pub fn action_name(&self) -> &'static str {
        match self {
            Decision::PromptUser { .. } => "prompt_user",
            Decision::SendInput { .. } => "send_input",
            Decision::Wait => "wait",
            Decision::Error { .. } => "error",
        }
    }

    /// Check the invariants the type system cannot express: `PromptUser`
    /// and `Error` carry a message the operator will actually see.
    pub fn validate(&self) -> Result<(), TillerError> {
        match self {
            Decision::PromptUser { message, .. } if message.trim().is_empty() => Err(
                TillerError::InvalidDecision("prompt_user requires a non-empty message".into()),
            ),
            Decision::Error { message } if message.trim().is_empty() => Err(
                TillerError::InvalidDecision("error requires a non-empty message".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// The oracle wire shape: what a remote model (or a config rule) produces
/// before validation.
///
/// Field names match the JSON contract the model is prompted for:
/// `action`, `message`, `input_type`, `suggested_input`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDecision {
    /// One of `prompt_user`, `send_input`, `wait`, `error`.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "input_type", skip_serializing_if = "Option::is_none")]
    pub input_kind: Option<InputKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_input: Option<String>,
}

impl TryFrom<RawDecision> for Decision {
    type Error = TillerError;

    fn try_from(raw: RawDecision) -> Result<Self, TillerError> {
        match raw.action.as_str() {
            "prompt_user" => {
                let message = raw
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| {
                        TillerError::InvalidDecision(
                            "prompt_user requires a non-empty message".into(),
                        )
                    })?;
                Ok(Decision::PromptUser {
                    message,
                    input_kind: raw.input_kind.unwrap_or(InputKind::Text),
                    suggested_input: raw.suggested_input,
                })
            }
            "send_input" => {
                let input = raw.suggested_input.ok_or_else(|| {
                    TillerError::InvalidDecision("send_input requires suggested_input".into())
                })?;
                Ok(Decision::SendInput { input })
            }
            "wait" => Ok(Decision::Wait),
            "error" => {
                let message = raw
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| {
                        TillerError::InvalidDecision("error requires a non-empty message".into())
                    })?;
                Ok(Decision::Error { message })
            }
            other => Err(TillerError::InvalidDecision(format!(
                "unknown action {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_user_from_wire_shape() {
        let raw: RawDecision = serde_json::from_str(
            r#"{"action": "prompt_user", "message": "Enter password", "input_type": "password"}"#,
        )
        .unwrap();
        let decision = Decision::try_from(raw).unwrap();
        assert_eq!(
            decision,
            Decision::PromptUser {
                message: "Enter password".into(),
                input_kind: InputKind::Password,
                suggested_input: None,
            }
        );
    }

    #[test]
    fn prompt_user_defaults_to_text_input() {
        let raw = RawDecision {
            action: "prompt_user".into(),
            message: Some("Your name?".into()),
            ..RawDecision::default()
        };
        match Decision::try_from(raw).unwrap() {
            Decision::PromptUser { input_kind, .. } => assert_eq!(input_kind, InputKind::Text),
            other => panic!("expected PromptUser, got {other:?}"),
        }
    }

    #[test]
    fn send_input_requires_suggested_input() {
        let raw = RawDecision {
            action: "send_input".into(),
            ..RawDecision::default()
        };
        let err = Decision::try_from(raw).unwrap_err();
        assert!(matches!(err, TillerError::InvalidDecision(_)));
    }

    #[test]
    fn prompt_user_rejects_blank_message() {
        let raw = RawDecision {
            action: "prompt_user".into(),
            message: Some("   ".into()),
            ..RawDecision::default()
        };
        assert!(matches!(
            Decision::try_from(raw),
            Err(TillerError::InvalidDecision(_))
        ));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let raw = RawDecision {
            action: "reboot".into(),
            ..RawDecision::default()
        };
        assert!(matches!(
            Decision::try_from(raw),
            Err(TillerError::InvalidDecision(_))
        ));
    }

    #[test]
    fn yesno_input_kind_wire_name() {
        let raw: RawDecision = serde_json::from_str(
            r#"{"action": "prompt_user", "message": "Continue?", "input_type": "yesno", "suggested_input": "y"}"#,
        )
        .unwrap();
        match Decision::try_from(raw).unwrap() {
            Decision::PromptUser {
                input_kind,
                suggested_input,
                ..
            } => {
                assert_eq!(input_kind, InputKind::YesNo);
                assert_eq!(suggested_input.as_deref(), Some("y"));
            }
            other => panic!("expected PromptUser, got {other:?}"),
        }
    }

    #[test]
    fn validate_catches_blank_error_message() {
        let decision = Decision::Error { message: "".into() };
        assert!(decision.validate().is_err());

        let decision = Decision::Error {
            message: "disk full".into(),
        };
        assert!(decision.validate().is_ok());
    }

    #[test]
    fn wait_and_send_input_always_validate() {
        assert!(Decision::Wait.validate().is_ok());
        assert!(Decision::SendInput { input: "y".into() }.validate().is_ok());
    }

    #[test]
    fn action_names() {
        assert_eq!(Decision::Wait.action_name(), "wait");
        assert_eq!(
            Decision::SendInput { input: "y".into() }.action_name(),
            "send_input"
        );
    }
}
