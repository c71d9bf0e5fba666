//! ESLint `--format json` output: an array of per-file results.

use crate::models::{LintError, Severity};
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResult {
    file_path: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    #[serde(default)]
    rule_id: Option<String>,
    severity: i64,
    message: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default)]
    fix: Option<Json>,
}

/// Parse ESLint JSON. Any structural mismatch discards the whole output.
pub fn parse(output: &str, root_dir: &str) -> Vec<LintError> {
    let results: Vec<FileResult> = match serde_json::from_str(output) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse ESLint output");
            return Vec::new();
        }
    };
    results
        .into_iter()
        .flat_map(|file| {
            let rel = relative_to(&file.file_path, root_dir);
            file.messages.into_iter().map(move |m| LintError {
                file: rel.clone(),
                line: m.line.unwrap_or(1).max(1),
                column: m.column.unwrap_or(1).max(1),
                rule: m.rule_id.unwrap_or_else(|| "unknown".to_string()),
                severity: if m.severity == 2 {
                    Severity::Error
                } else {
                    Severity::Warning
                },
                message: m.message,
                fixable: m.fix.map(|f| !f.is_null()).unwrap_or(false),
            })
        })
        .collect()
}

/// Strip `root_dir` plus one separator from `path`; unrelated paths pass
/// through unchanged.
fn relative_to(path: &str, root_dir: &str) -> String {
    let root = root_dir.trim_end_matches(['/', '\\']);
    if root.is_empty() {
        return path.to_string();
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\')))
        .unwrap_or(path)
        .to_string()
}
