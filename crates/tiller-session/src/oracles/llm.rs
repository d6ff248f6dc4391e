//! Remote-model decision oracle.
//!
//! Sends the buffered transcript to a chat endpoint (Anthropic or OpenAI)
//! and parses the reply as a wire decision. The model is instructed to
//! answer with a single JSON object; fenced replies are tolerated. The
//! request blocks the controller thread, which is fine -- the loop invokes
//! at most one decision at a time by design.
//!
//! API keys are read from environment variables at runtime, never stored
//! in configuration.

use std::time::Duration;

use tiller_types::{
    Decision, LlmConfig, LlmProvider, RawDecision, TillerError, ANTHROPIC_API_KEY_ENV,
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_OPENAI_MODEL, OPENAI_API_KEY_ENV,
};

use crate::oracle::DecisionOracle;

const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";

/// Bound on how long one decision may take. Expiry surfaces as an oracle
/// failure, which the controller degrades to a wait.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "\
You supervise an interactive terminal session on behalf of a user. You are \
shown the output the session has produced since your last decision. Respond \
with a single JSON object and nothing else, using these fields:\n\
- \"action\": \"prompt_user\" if a human must provide input, \"send_input\" \
if the input can be provided automatically, \"wait\" if the session is still \
working and needs nothing, \"error\" if the output shows a problem worth \
reporting.\n\
- \"message\": required for prompt_user and error; a clear instruction or \
diagnosis for the user.\n\
- \"input_type\": for prompt_user; one of \"password\", \"yesno\", \"text\".\n\
- \"suggested_input\": required for send_input; for prompt_user, an optional \
default answer.";

/// Chat-endpoint-backed oracle.
pub struct LlmOracle {
    provider: LlmProvider,
    model: String,
    endpoint: String,
    max_tokens: u32,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl LlmOracle {
    /// Resolve the model, endpoint, and API key from configuration.
    ///
    /// Fails with a configuration error if the key environment variable is
    /// unset -- better to refuse up front than to fail on the first prompt.
    pub fn new(config: &LlmConfig) -> Result<Self, TillerError> {
        let key_env = config.api_key_env.clone().unwrap_or_else(|| {
            match config.provider {
                LlmProvider::Anthropic => ANTHROPIC_API_KEY_ENV,
                LlmProvider::OpenAi => OPENAI_API_KEY_ENV,
            }
            .to_string()
        });
        let api_key = std::env::var(&key_env)
            .map_err(|_| TillerError::Config(format!("API key env var {key_env} is not set")))?;

        let model = if config.model.is_empty() {
            match config.provider {
                LlmProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
                LlmProvider::OpenAi => DEFAULT_OPENAI_MODEL,
            }
            .to_string()
        } else {
            config.model.clone()
        };

        let endpoint = config.endpoint.clone().unwrap_or_else(|| {
            match config.provider {
                LlmProvider::Anthropic => DEFAULT_ANTHROPIC_ENDPOINT,
                LlmProvider::OpenAi => DEFAULT_OPENAI_ENDPOINT,
            }
            .to_string()
        });

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TillerError::Oracle(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider: config.provider,
            model,
            endpoint,
            max_tokens: config.max_tokens,
            api_key,
            client,
        })
    }

    fn request_anthropic(&self, transcript: &str) -> Result<String, TillerError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": SYSTEM_PROMPT,
            "messages": [{
                "role": "user",
                "content": format!("Terminal output since your last decision:\n{transcript}"),
            }],
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| TillerError::Oracle(format!("HTTP error: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| TillerError::Oracle(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(TillerError::Oracle(format!(
                "Anthropic API error {status}: {text}"
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| TillerError::Oracle(format!("JSON parse error: {e}")))?;

        parsed["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| TillerError::Oracle(format!("unexpected response shape: {text}")))
    }

    fn request_openai(&self, transcript: &str) -> Result<String, TillerError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!("Terminal output since your last decision:\n{transcript}"),
                },
            ],
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| TillerError::Oracle(format!("HTTP error: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| TillerError::Oracle(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(TillerError::Oracle(format!(
                "OpenAI API error {status}: {text}"
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| TillerError::Oracle(format!("JSON parse error: {e}")))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| TillerError::Oracle(format!("unexpected response shape: {text}")))
    }
}

impl DecisionOracle for LlmOracle {
    fn name(&self) -> &str {
        "llm"
    }

    fn decide(&mut self, transcript: &str) -> Result<Decision, TillerError> {
        let reply = match self.provider {
            LlmProvider::Anthropic => self.request_anthropic(transcript)?,
            LlmProvider::OpenAi => self.request_openai(transcript)?,
        };
        parse_reply(&reply)
    }
}

/// Parse a model reply into a validated decision.
///
/// Invalid JSON is an oracle failure (the model misbehaved at the
/// transport level); well-formed JSON with a contract violation is an
/// invalid decision, which the controller handles without counting it
/// against the oracle's availability.
fn parse_reply(reply: &str) -> Result<Decision, TillerError> {
    let raw: RawDecision = serde_json::from_str(extract_json(reply))
        .map_err(|e| TillerError::Oracle(format!("model reply is not a decision: {e}")))?;
    Decision::try_from(raw)
}

/// Pull the JSON object out of a reply that may be fenced or chatty.
fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    // Models occasionally fence the object or prefix a sentence despite
    // the instructions; take the outermost braces.
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
