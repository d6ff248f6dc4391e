//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use tiller_session::pty::PtySession;
use tiller_types::{ControllerConfig, Decision, InputKind};

/// Spawn a shell one-liner in a PTY.
pub fn spawn_sh(script: &str) -> PtySession {
    PtySession::spawn("/bin/sh", &["-c".to_string(), script.to_string()])
        .expect("should spawn /bin/sh")
}

/// A fast, quiet controller configuration for tests.
pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        poll_timeout_ms: 100,
        echo_output: false,
        ..ControllerConfig::default()
    }
}

pub fn send_input(input: &str) -> Decision {
    Decision::SendInput {
        input: input.into(),
    }
}

pub fn prompt_user(message: &str, kind: InputKind) -> Decision {
    Decision::PromptUser {
        message: message.into(),
        input_kind: kind,
        suggested_input: None,
    }
}
