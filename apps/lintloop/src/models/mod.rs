//! Shared data models for targets, diagnostics, lint results and the
//! outbound fix request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker value of the `task` field carried by every fix request.
pub const FIX_TASK: &str = "fix_lint_errors";

/// Guidance sent with every fix request.
pub const FIX_INSTRUCTION: &str =
    "Fix these lint errors by editing files. Do not disable lint rules.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Toolchain family whose diagnostic output has a distinct wire format.
pub enum Ecosystem {
    Js,
    Go,
    Rust,
}

impl Ecosystem {
    /// Resolve a configuration tag (`js|go|rust`), exactly as serde does.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "js" => Some(Self::Js),
            "go" => Some(Self::Go),
            "rust" => Some(Self::Rust),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Go => "go",
            Self::Rust => "rust",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Where and how one toolchain's linter applies.
pub struct LintTarget {
    pub pattern: String,
    pub ecosystem: Ecosystem,
    pub check: String,
    pub fix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A canonical diagnostic produced by one of the output parsers.
pub struct LintError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub fixable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Per-result counters. `fixable + unfixable == total` always holds.
pub struct Summary {
    total: usize,
    fixable: usize,
    unfixable: usize,
}

impl Summary {
    fn counted(errors: &[LintError]) -> Self {
        let fixable = errors.iter().filter(|e| e.fixable).count();
        Self {
            total: errors.len(),
            fixable,
            unfixable: errors.len() - fixable,
        }
    }

    fn unverified(errors: &[LintError]) -> Self {
        Self {
            total: errors.len(),
            fixable: 0,
            unfixable: errors.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn fixable(&self) -> usize {
        self.fixable
    }

    pub fn unfixable(&self) -> usize {
        self.unfixable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Diagnostics gathered for one target by one check invocation.
///
/// Only constructible through [`LintResult::new`] and
/// [`LintResult::unverified`], so the summary always agrees with `errors`.
pub struct LintResult {
    ecosystem: Ecosystem,
    target: String,
    errors: Vec<LintError>,
    summary: Summary,
}

impl LintResult {
    /// Result of a check that ran to completion; fixability comes from the
    /// parsed diagnostics.
    pub fn new(ecosystem: Ecosystem, target: impl Into<String>, errors: Vec<LintError>) -> Self {
        let summary = Summary::counted(&errors);
        Self {
            ecosystem,
            target: target.into(),
            errors,
            summary,
        }
    }

    /// Result of a check whose command could not be executed. Fixability
    /// cannot be asserted, so every diagnostic counts as unfixable.
    pub fn unverified(
        ecosystem: Ecosystem,
        target: impl Into<String>,
        errors: Vec<LintError>,
    ) -> Self {
        let summary = Summary::unverified(&errors);
        Self {
            ecosystem,
            target: target.into(),
            errors,
            summary,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn errors(&self) -> &[LintError] {
        &self.errors
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Iteration budget reconstructed from conversation history for one run.
pub struct IterationState {
    pub prior_attempts: u32,
    pub max_iterations: u32,
}

impl IterationState {
    pub fn new(prior_attempts: u32, max_iterations: u32) -> Self {
        Self {
            prior_attempts,
            max_iterations: max_iterations.max(1),
        }
    }

    /// True when no further run may perform check/fix work.
    pub fn is_exhausted(&self) -> bool {
        self.prior_attempts >= self.max_iterations
    }

    /// Iteration number a request issued by this run would carry.
    pub fn next_iteration(&self) -> u32 {
        self.prior_attempts.saturating_add(1)
    }

    /// Whether a run that still has errors may ask for another attempt.
    pub fn can_request(&self) -> bool {
        self.next_iteration() < self.max_iterations
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Machine-readable follow-up instruction embedded in a conversation.
pub struct FixRequest {
    pub task: &'static str,
    pub instruction: &'static str,
    pub iteration: u32,
    pub max_iterations: u32,
    pub results: Vec<LintResult>,
}

impl FixRequest {
    pub fn new(state: IterationState, results: Vec<LintResult>) -> Self {
        Self {
            task: FIX_TASK,
            instruction: FIX_INSTRUCTION,
            iteration: state.next_iteration(),
            max_iterations: state.max_iterations,
            results,
        }
    }

    /// Compact single-line JSON. The compact form is what history scanning
    /// looks for, so this must not be pretty-printed.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(fixable: bool) -> LintError {
        LintError {
            file: "src/a.ts".into(),
            line: 1,
            column: 1,
            rule: "r".into(),
            severity: Severity::Error,
            message: "m".into(),
            fixable,
        }
    }

    #[test]
    fn test_summary_counts_fixable_and_unfixable() {
        let res = LintResult::new(Ecosystem::Js, "src/**/*.ts", vec![err(true), err(false), err(true)]);
        let s = res.summary();
        assert_eq!(s.total(), 3);
        assert_eq!(s.fixable(), 2);
        assert_eq!(s.unfixable(), 1);
        assert_eq!(s.total(), s.fixable() + s.unfixable());
    }

    #[test]
    fn test_unverified_forces_zero_fixable() {
        let res = LintResult::unverified(Ecosystem::Go, "**/*.go", vec![err(true), err(true)]);
        let s = res.summary();
        assert_eq!(s.total(), 2);
        assert_eq!(s.fixable(), 0);
        assert_eq!(s.unfixable(), 2);
    }

    #[test]
    fn test_iteration_state_boundaries() {
        let st = IterationState::new(0, 3);
        assert!(!st.is_exhausted());
        assert!(st.can_request());
        let st = IterationState::new(2, 3);
        assert_eq!(st.next_iteration(), 3);
        assert!(!st.can_request());
        assert!(IterationState::new(3, 3).is_exhausted());
        // zero budget is clamped to one attempt
        assert_eq!(IterationState::new(0, 0).max_iterations, 1);
    }

    #[test]
    fn test_fix_request_payload_shape() {
        let res = LintResult::new(Ecosystem::Rust, "**/*.rs", vec![err(false)]);
        let req = FixRequest::new(IterationState::new(1, 3), vec![res]);
        let payload = req.to_payload();
        assert!(payload.starts_with(r#"{"task":"fix_lint_errors""#));
        let v: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(v["iteration"], 2);
        assert_eq!(v["maxIterations"], 3);
        assert_eq!(v["results"][0]["ecosystem"], "rust");
        assert_eq!(v["results"][0]["target"], "**/*.rs");
        assert_eq!(v["results"][0]["summary"]["unfixable"], 1);
        assert_eq!(v["results"][0]["errors"][0]["severity"], "error");
    }
}
