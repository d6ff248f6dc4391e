//! Write a starter configuration file.

use std::path::Path;

use anyhow::{bail, Context, Result};

use tiller_types::CONFIG_FILENAME;

const STARTER_CONFIG: &str = r#"# Tiller configuration.
#
# The controller reads the session's output and the configured oracle
# decides what to do with it: answer the child automatically, ask you,
# report an error, or keep waiting.

[controller]
# Per-iteration read timeout in milliseconds.
poll_timeout_ms = 1000
# Consecutive wait decisions on unresolved output before a stall warning.
max_consecutive_waits = 30
# Consecutive oracle failures before the session is failed.
max_oracle_failures = 3

[oracle]
# "rules" matches the regex patterns below; "llm" asks a remote model.
kind = "rules"

# Answer yes/no confirmations automatically.
[[oracle.rules]]
pattern = '(?i)continue\? \[y/n\]'
action = "send_input"
suggested_input = "y"

# Ask for passwords with echo suppressed.
[[oracle.rules]]
pattern = '(?i)password:'
action = "prompt_user"
input_type = "password"
message = "The session is asking for a password"

# Settings for the llm oracle (used when kind = "llm").
[oracle.llm]
provider = "anthropic"
model = "claude-sonnet-4-20250514"
# api_key_env = "ANTHROPIC_API_KEY"
"#;

pub fn run(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_FILENAME);
    if path.exists() && !force {
        bail!("{CONFIG_FILENAME} already exists (use --force to overwrite)");
    }

    std::fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("failed to write {CONFIG_FILENAME}"))?;
    println!("Wrote {CONFIG_FILENAME}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_types::{OracleKind, TillerConfig};

    #[test]
    fn starter_config_parses() {
        let config = TillerConfig::from_toml(STARTER_CONFIG).unwrap();
        assert_eq!(config.oracle.kind, OracleKind::Rules);
        assert_eq!(config.oracle.rules.len(), 2);
        assert_eq!(config.controller.poll_timeout_ms, 1000);
    }
}
