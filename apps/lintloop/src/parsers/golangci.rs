//! golangci-lint `--out-format json` output.
//!
//! The format has no severity or autofix signal, so every issue is an
//! unfixable error.

use crate::models::{LintError, Severity};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Report {
    #[serde(default)]
    issues: Option<Vec<Issue>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Issue {
    from_linter: String,
    text: String,
    pos: Position,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Position {
    filename: String,
    line: u32,
    #[serde(default)]
    column: u32,
}

pub fn parse(output: &str) -> Vec<LintError> {
    let report: Report = match serde_json::from_str(output) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse golangci-lint output");
            return Vec::new();
        }
    };
    report
        .issues
        .unwrap_or_default()
        .into_iter()
        .map(|issue| LintError {
            file: issue.pos.filename,
            line: issue.pos.line.max(1),
            column: issue.pos.column.max(1),
            rule: issue.from_linter,
            severity: Severity::Error,
            message: issue.text,
            fixable: false,
        })
        .collect()
}
