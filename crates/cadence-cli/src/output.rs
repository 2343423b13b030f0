//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: framed tables for humans, tab-separated rows for scripts,
//! or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use cadence_core::CadenceError;
use cadence_core::error::ErrorCode;
use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<16} {}", format!("{key}:"), value.as_ref())
}

/// Write left-aligned columns sized to the widest cell in each.
pub fn pretty_table(w: &mut dyn Write, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    table_row(w, headers, &widths)?;
    let rules: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    table_row(w, &rules.iter().map(String::as_str).collect::<Vec<_>>(), &widths)?;
    for row in rows {
        table_row(w, &row.iter().map(String::as_str).collect::<Vec<_>>(), &widths)?;
    }
    Ok(())
}

fn table_row(w: &mut dyn Write, cells: &[&str], widths: &[usize]) -> io::Result<()> {
    let text = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(w, "{}", text.trim_end())
}

/// Hours with one decimal, the way every table prints them.
#[must_use]
pub fn hours(value: f64) -> String {
    format!("{value:.1}")
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (tables, sections, visual framing).
    Pretty,
    /// Tab-separated plain text for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {}
        }
    }

    if is_tty { OutputMode::Pretty } else { OutputMode::Text }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// Render `value` into `w` with explicit text and pretty renderers.
///
/// # Errors
///
/// Fails when serialization or the writer fails.
pub fn render_mode_to<T: Serialize>(
    w: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, value)?;
            writeln!(w)?;
        }
        OutputMode::Text => text_fn(value, w)?,
        OutputMode::Pretty => pretty_fn(value, w)?,
    }
    Ok(())
}

/// Render a serializable value to stdout with explicit text/pretty renderers.
///
/// # Errors
///
/// Fails when serialization or writing to stdout fails.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_mode_to(&mut out, mode, value, text_fn, pretty_fn)
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }

    /// Classify a command failure, keeping its full context chain.
    #[must_use]
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match err.downcast_ref::<CadenceError>() {
            Some(cadence) => Self {
                message,
                ..Self::from(cadence)
            },
            None => {
                let code = ErrorCode::InternalUnexpected;
                Self::with_details(message, code.hint().unwrap_or_else(|| code.message()), code.code())
            }
        }
    }
}

/// Convert a [`CadenceError`] into a [`CliError`].
impl From<&CadenceError> for CliError {
    fn from(err: &CadenceError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.error_code().to_string()),
        }
    }
}

/// Write an error in the requested format.
///
/// # Errors
///
/// Fails when serialization or the writer fails.
pub fn render_error_to(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(w, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
///
/// # Errors
///
/// Fails when writing to stderr fails.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── resolve_output_mode_inner ───────────────────────────────────────────

    #[test]
    fn resolve_format_flag_wins_over_json_and_env() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_format_env_case_insensitive() {
        let mode = resolve_output_mode_inner(None, false, Some("JSON"), false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_format_env_unknown_falls_through_to_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("fancy"), true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("fancy"), false),
            OutputMode::Text
        );
    }

    #[test]
    fn resolve_default_no_tty_is_text() {
        assert_eq!(resolve_output_mode_inner(None, false, None, false), OutputMode::Text);
    }

    // ── rendering ───────────────────────────────────────────────────────────

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        hours: f64,
    }

    fn render_sample(mode: OutputMode) -> String {
        let mut buf = Vec::new();
        render_mode_to(
            &mut buf,
            mode,
            &Sample {
                name: "Alice",
                hours: 12.5,
            },
            |s, w| writeln!(w, "{}\t{}", s.name, hours(s.hours)),
            |s, w| pretty_kv(w, s.name, hours(s.hours)),
        )
        .expect("render succeeds");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn each_mode_uses_its_renderer() {
        assert_eq!(render_sample(OutputMode::Text), "Alice\t12.5\n");
        assert!(render_sample(OutputMode::Pretty).starts_with("Alice:"));

        let json: serde_json::Value = serde_json::from_str(&render_sample(OutputMode::Json)).expect("valid json");
        assert_eq!(json["name"], "Alice");
    }

    #[test]
    fn table_columns_align_to_widest_cell() {
        let mut buf = Vec::new();
        let rows = vec![vec!["1".to_string(), "Login page".to_string()], vec!["22".to_string(), "API".to_string()]];
        pretty_table(&mut buf, &["ID", "Title"], &rows).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "ID  Title\n--  ----------\n1   Login page\n22  API\n");
    }

    #[test]
    fn cadence_errors_keep_their_code() {
        let err = CadenceError::Schema {
            missing: vec!["Title".into()],
        };
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.message.contains("Title"));
    }

    #[test]
    fn anyhow_context_is_kept_in_message() {
        let err = anyhow::Error::from(CadenceError::EmptyTeam).context("planning sprints");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1004"));
        assert!(cli.message.starts_with("planning sprints"));

        let other = CliError::from_anyhow(&anyhow::anyhow!("boom"));
        assert_eq!(other.error_code.as_deref(), Some("E9001"));
    }

    #[test]
    fn json_errors_are_wrapped() {
        let mut buf = Vec::new();
        let err = CliError::with_details("bad", "fix it", "E1001");
        render_error_to(&mut buf, OutputMode::Json, &err).expect("render");
        let json: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(json["error"]["error_code"], "E1001");
        assert_eq!(json["error"]["suggestion"], "fix it");
    }
}
