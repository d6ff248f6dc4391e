//! Configuration for the controller and oracles, loaded from `tiller.toml`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decision::RawDecision;
use crate::TillerError;

/// Default configuration file name.
pub const CONFIG_FILENAME: &str = "tiller.toml";

/// Default Anthropic model for the llm oracle.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Default OpenAI model for the llm oracle.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default environment variable for the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default environment variable for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_max_consecutive_waits() -> u32 {
    30
}

fn default_max_oracle_failures() -> u32 {
    3
}

fn default_max_transcript_bytes() -> usize {
    64 * 1024
}

fn default_echo_output() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    1024
}

/// Tunables for the session control loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// Per-iteration read timeout in milliseconds. A timeout is a normal
    /// outcome (the child is quietly waiting), not an error.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Consecutive wait decisions on unresolved output before a stall
    /// warning is reported. Zero disables stall warnings.
    #[serde(default = "default_max_consecutive_waits")]
    pub max_consecutive_waits: u32,
    /// Consecutive oracle failures before the session is failed.
    #[serde(default = "default_max_oracle_failures")]
    pub max_oracle_failures: u32,
    /// Cap on buffered output bytes; the oldest bytes are dropped beyond
    /// this so an unresolved flood cannot grow without bound.
    #[serde(default = "default_max_transcript_bytes")]
    pub max_transcript_bytes: usize,
    /// Mirror raw child output to the operator's stdout.
    #[serde(default = "default_echo_output")]
    pub echo_output: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            max_consecutive_waits: default_max_consecutive_waits(),
            max_oracle_failures: default_max_oracle_failures(),
            max_transcript_bytes: default_max_transcript_bytes(),
            echo_output: default_echo_output(),
        }
    }
}

/// One regex-triggered rule for the rules oracle.
///
/// The pattern is matched against the ANSI-stripped buffer snapshot; the
/// decision fields use the same wire names as the model contract
/// (`action`, `message`, `input_type`, `suggested_input`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    /// Regex applied to the accumulated output.
    pub pattern: String,
    /// The decision taken when the pattern matches.
    #[serde(flatten)]
    pub decision: RawDecision,
}

/// Remote-model provider for the llm oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

/// Remote-model oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    #[serde(default = "LlmConfig::default_provider")]
    pub provider: LlmProvider,
    /// Model name; empty selects the provider's default.
    #[serde(default)]
    pub model: String,
    /// Environment variable holding the API key; defaults per provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Override the provider's default endpoint (e.g. a proxy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LlmConfig {
    fn default_provider() -> LlmProvider {
        LlmProvider::Anthropic
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            model: String::new(),
            api_key_env: None,
            endpoint: None,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Which oracle drives the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Regex rules evaluated in order; first match wins.
    #[default]
    Rules,
    /// Remote model (Anthropic or OpenAI chat endpoint).
    Llm,
}

/// Oracle selection plus the settings for each built-in oracle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    #[serde(default)]
    pub kind: OracleKind,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Top-level configuration, loaded from [`CONFIG_FILENAME`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TillerConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl TillerConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, TillerError> {
        toml::from_str(content).map_err(|e| TillerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, TillerError> {
        toml::to_string_pretty(self).map_err(|e| TillerError::Config(e.to_string()))
    }

    /// Load a configuration from a file on disk.
    pub fn load(path: &Path) -> Result<Self, TillerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TillerError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = TillerConfig::default();
        let toml = config.to_toml().unwrap();
        let back = TillerConfig::from_toml(&toml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = TillerConfig::from_toml("").unwrap();
        assert_eq!(config.controller.poll_timeout_ms, 1000);
        assert_eq!(config.controller.max_oracle_failures, 3);
        assert_eq!(config.oracle.kind, OracleKind::Rules);
        assert!(config.oracle.rules.is_empty());
    }

    #[test]
    fn parses_rules_with_flattened_decisions() {
        let config = TillerConfig::from_toml(
            r#"
            [controller]
            poll_timeout_ms = 250
            echo_output = false

            [oracle]
            kind = "rules"

            [[oracle.rules]]
            pattern = '(?i)continue\? \[y/n\]'
            action = "send_input"
            suggested_input = "y"

            [[oracle.rules]]
            pattern = '(?i)password:'
            action = "prompt_user"
            input_type = "password"
            message = "The session is asking for a password"
            "#,
        )
        .unwrap();

        assert_eq!(config.controller.poll_timeout_ms, 250);
        assert!(!config.controller.echo_output);
        assert_eq!(config.oracle.rules.len(), 2);
        assert_eq!(config.oracle.rules[0].decision.action, "send_input");
        assert_eq!(
            config.oracle.rules[0].decision.suggested_input.as_deref(),
            Some("y")
        );
        assert_eq!(
            config.oracle.rules[1].decision.message.as_deref(),
            Some("The session is asking for a password")
        );
    }

    #[test]
    fn parses_llm_section() {
        let config = TillerConfig::from_toml(
            r#"
            [oracle]
            kind = "llm"

            [oracle.llm]
            provider = "openai"
            model = "gpt-4o"
            api_key_env = "MY_KEY"
            "#,
        )
        .unwrap();

        assert_eq!(config.oracle.kind, OracleKind::Llm);
        assert_eq!(config.oracle.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.oracle.llm.model, "gpt-4o");
        assert_eq!(config.oracle.llm.api_key_env.as_deref(), Some("MY_KEY"));
        assert_eq!(config.oracle.llm.max_tokens, 1024);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            TillerConfig::from_toml("controller = 3"),
            Err(TillerError::Config(_))
        ));
    }
}
