//! Terminal-backed human input with inquire → stdin fallback.
//!
//! If inquire cannot drive the terminal (e.g. not a real TTY), each prompt
//! degrades to a plain stdin read. The password fallback reads with echo,
//! so a real terminal is strongly preferred for secret input.

use std::io::{self, BufRead, Write};

use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Text};

use tiller_session::human::HumanInput;
use tiller_types::{InputKind, TillerError};

/// Human input collected on the operator's terminal.
pub struct TerminalHuman;

impl HumanInput for TerminalHuman {
    fn request(
        &mut self,
        message: &str,
        kind: InputKind,
        default: Option<&str>,
    ) -> Result<String, TillerError> {
        match kind {
            InputKind::Password => password(message),
            InputKind::YesNo => confirm(message, default),
            InputKind::Text => text(message, default),
        }
    }
}

/// Read a trimmed line from stdin.
fn read_line() -> Result<String, TillerError> {
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| TillerError::Human(format!("failed to read input: {e}")))?;
    Ok(input.trim().to_string())
}

fn flush_prompt(prompt: &str) -> Result<(), TillerError> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|e| TillerError::Human(format!("failed to write prompt: {e}")))
}

fn cancelled(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

fn password(message: &str) -> Result<String, TillerError> {
    match Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
    {
        Ok(v) => Ok(v),
        Err(e) if cancelled(&e) => Err(TillerError::Human("cancelled".into())),
        Err(_) => {
            flush_prompt(&format!("{message}: "))?;
            read_line()
        }
    }
}

fn confirm(message: &str, default: Option<&str>) -> Result<String, TillerError> {
    let default_yes = default
        .map(|s| {
            let s = s.trim().to_ascii_lowercase();
            s == "y" || s == "yes"
        })
        .unwrap_or(false);

    match Confirm::new(message).with_default(default_yes).prompt() {
        Ok(true) => Ok("y".into()),
        Ok(false) => Ok("n".into()),
        Err(e) if cancelled(&e) => Err(TillerError::Human("cancelled".into())),
        Err(_) => {
            let hint = if default_yes { "Y/n" } else { "y/N" };
            flush_prompt(&format!("{message} ({hint}) "))?;
            let input = read_line()?;
            Ok(match input.to_ascii_lowercase().as_str() {
                "y" | "yes" => "y".into(),
                "n" | "no" => "n".into(),
                _ if default_yes => "y".into(),
                _ => "n".into(),
            })
        }
    }
}

fn text(message: &str, default: Option<&str>) -> Result<String, TillerError> {
    let mut prompt = Text::new(message);
    if let Some(d) = default {
        prompt = prompt.with_default(d);
    }
    match prompt.prompt() {
        Ok(v) => Ok(v),
        Err(e) if cancelled(&e) => Err(TillerError::Human("cancelled".into())),
        Err(_) => {
            match default {
                Some(d) => flush_prompt(&format!("{message} [{d}]: "))?,
                None => flush_prompt(&format!("{message}: "))?,
            }
            let input = read_line()?;
            if input.is_empty() {
                if let Some(d) = default {
                    return Ok(d.to_string());
                }
            }
            Ok(input)
        }
    }
}
