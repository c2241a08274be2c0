//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its
//! output accordingly: readable text for humans, stable JSON for
//! scripts and agents.

use serde::Serialize;
use sprig_core::error::ErrorCode;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// A blocking error with a stable code, rendered before a non-zero exit.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code().to_string(),
            message: message.into(),
            hint: code.hint().map(str::to_string),
        }
    }
}

/// Render a success payload: `value` as JSON, or the human line.
pub fn render_success<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: &str,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if mode.is_json() {
        serde_json::to_writer(&mut stdout, value)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{human}")?;
    }
    Ok(())
}

/// Render a blocking error to stderr.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut stderr = io::stderr().lock();
    if mode.is_json() {
        serde_json::to_writer(&mut stderr, &serde_json::json!({ "error": error }))?;
        writeln!(stderr)?;
    } else {
        writeln!(stderr, "error[{}]: {}", error.code, error.message)?;
        if let Some(hint) = &error.hint {
            writeln!(stderr, "hint: {hint}")?;
        }
    }
    Ok(())
}

/// Render a non-blocking warning (skipped rows and the like) to stderr.
pub fn render_warning(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let mut stderr = io::stderr().lock();
    if mode.is_json() {
        serde_json::to_writer(&mut stderr, &serde_json::json!({ "warning": message }))?;
        writeln!(stderr)?;
    } else {
        writeln!(stderr, "warning: {message}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CliError, OutputMode};
    use sprig_core::error::ErrorCode;

    #[test]
    fn cli_error_carries_code_and_hint() {
        let error = CliError::new(ErrorCode::AmbiguousId, "prefix 'a' matches 3 tasks");
        assert_eq!(error.code, "E2002");
        assert!(error.hint.is_some());
    }

    #[test]
    fn json_mode_detection() {
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Human.is_json());
    }
}
