//! `cargo clippy --message-format=json` output: one JSON record per line.
//!
//! Only `compiler-message` records with a primary span produce
//! diagnostics. A bad line is skipped on its own; the remaining lines are
//! still parsed.

use crate::models::{LintError, Severity};
use serde::Deserialize;

/// Rule name used when a diagnostic carries no lint code.
const FALLBACK_RULE: &str = "clippy";

/// Substring of a `help` child that marks a concrete suggestion.
const SUGGESTION_MARKER: &str = "did you mean";

#[derive(Deserialize)]
#[serde(tag = "reason")]
enum CargoMessage {
    #[serde(rename = "compiler-message")]
    CompilerMessage { message: Diagnostic },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Diagnostic {
    message: String,
    level: String,
    #[serde(default)]
    code: Option<DiagnosticCode>,
    #[serde(default)]
    spans: Vec<Span>,
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct DiagnosticCode {
    code: String,
}

#[derive(Deserialize)]
struct Span {
    file_name: String,
    line_start: u32,
    column_start: u32,
    #[serde(default)]
    is_primary: bool,
}

#[derive(Deserialize)]
struct Child {
    #[serde(default)]
    level: String,
    #[serde(default)]
    message: String,
}

impl Diagnostic {
    fn primary_span(&self) -> Option<&Span> {
        self.spans.iter().find(|s| s.is_primary)
    }

    /// Heuristic: rustc exposes no structured "fixable" flag in the
    /// fields we read, so a `help: did you mean ...` child counts.
    fn has_suggestion(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.level == "help" && c.message.contains(SUGGESTION_MARKER))
    }

    fn into_lint_error(self) -> Option<LintError> {
        let span = self.primary_span()?;
        let (file, line, column) = (span.file_name.clone(), span.line_start, span.column_start);
        let fixable = self.has_suggestion();
        let rule = self
            .code
            .map(|c| c.code)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| FALLBACK_RULE.to_string());
        Some(LintError {
            file,
            line: line.max(1),
            column: column.max(1),
            rule,
            severity: if self.level == "error" {
                Severity::Error
            } else {
                Severity::Warning
            },
            message: self.message,
            fixable,
        })
    }
}

pub fn parse(output: &str) -> Vec<LintError> {
    let mut errors = Vec::new();
    let mut skipped = 0usize;
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CargoMessage>(line) {
            Ok(CargoMessage::CompilerMessage { message }) => {
                if let Some(e) = message.into_lint_error() {
                    errors.push(e);
                }
            }
            Ok(CargoMessage::Other) => {}
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "skipped unparseable clippy lines");
    }
    errors
}
