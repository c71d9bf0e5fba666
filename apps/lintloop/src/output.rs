//! Output rendering for check results, run outcomes and parsed diagnostics.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-target results and a top-level summary.

use crate::controller::{Outcome, SkipReason};
use crate::models::{LintError, LintResult, Severity};
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && utils::colors_enabled()
}

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => tracing::error!(error = %e, "failed to render JSON output"),
    }
}

fn render_error(e: &LintError, color: bool) -> String {
    let (icon, sev) = match e.severity {
        Severity::Error => ("✖", "⟦error⟧"),
        Severity::Warning => ("▲", "⟦warn⟧"),
    };
    let loc = format!("{}:{}:{}", e.file, e.line, e.column);
    let fix = if e.fixable { " (fixable)" } else { "" };
    if color {
        let (icon, sev) = match e.severity {
            Severity::Error => (icon.red().to_string(), sev.red().bold().to_string()),
            Severity::Warning => (icon.yellow().to_string(), sev.yellow().bold().to_string()),
        };
        format!("{} {} {} ❲{}❳ {}{}", icon, sev, loc.bold(), e.rule, e.message, fix.dimmed())
    } else {
        format!("{} {} {} ❲{}❳ {}{}", icon, sev, loc, e.rule, e.message, fix)
    }
}

/// Print check results in the requested format.
pub fn print_results(results: &[LintResult], output: &str) {
    match output {
        "json" => print_json(&compose_results_json(results)),
        _ => {
            let color = use_colors(output);
            for r in results {
                let header = format!("[{}] {}", r.ecosystem(), r.target());
                if color {
                    println!("{}", header.cyan().bold());
                } else {
                    println!("{}", header);
                }
                for e in r.errors() {
                    println!("  {}", render_error(e, color));
                }
            }
            let totals = totals(results);
            let summary = format!(
                "— Summary — targets={} total={} fixable={} unfixable={}",
                results.len(),
                totals.0,
                totals.1,
                totals.2
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print the outcome of a `run`. A fix request is always printed verbatim
/// as a single line so it can be piped into a conversation.
pub fn print_outcome(outcome: &Outcome, output: &str) {
    match output {
        "json" => print_json(&compose_outcome_json(outcome)),
        _ => match outcome {
            Outcome::Skipped(reason) => {
                let why = match reason {
                    SkipReason::NoChanges => "no changed files".to_string(),
                    SkipReason::NoTargets => "no lint target matches the changed files".to_string(),
                    SkipReason::HistoryUnavailable => {
                        "conversation history could not be read".to_string()
                    }
                    SkipReason::BudgetExhausted { prior_attempts } => format!(
                        "iteration budget spent ({} prior fix requests)",
                        prior_attempts
                    ),
                };
                eprintln!("{} skipped: {}", utils::note_prefix(), why);
            }
            Outcome::Passed => {}
            Outcome::Requested(req) => println!("{}", req.to_payload()),
            Outcome::Exhausted { results, .. } => print_results(results, output),
        },
    }
}

/// Print canonical diagnostics produced by a parser.
pub fn print_errors(errors: &[LintError]) {
    print_json(&serde_json::to_value(errors).unwrap_or(JsonVal::Null));
}

fn totals(results: &[LintResult]) -> (usize, usize, usize) {
    results.iter().fold((0, 0, 0), |acc, r| {
        let s = r.summary();
        (acc.0 + s.total(), acc.1 + s.fixable(), acc.2 + s.unfixable())
    })
}

/// Compose results JSON (pure) for testing/snapshot purposes.
pub fn compose_results_json(results: &[LintResult]) -> JsonVal {
    let (total, fixable, unfixable) = totals(results);
    json!({
        "results": results,
        "summary": {
            "targets": results.len(),
            "total": total,
            "fixable": fixable,
            "unfixable": unfixable,
        }
    })
}

/// Compose outcome JSON (pure) for testing/snapshot purposes.
pub fn compose_outcome_json(outcome: &Outcome) -> JsonVal {
    match outcome {
        Outcome::Skipped(reason) => {
            let (why, prior) = match reason {
                SkipReason::NoChanges => ("no_changes", None),
                SkipReason::NoTargets => ("no_targets", None),
                SkipReason::HistoryUnavailable => ("history_unavailable", None),
                SkipReason::BudgetExhausted { prior_attempts } => {
                    ("budget_exhausted", Some(*prior_attempts))
                }
            };
            json!({"outcome": "skipped", "reason": why, "priorAttempts": prior})
        }
        Outcome::Passed => json!({"outcome": "passed"}),
        Outcome::Requested(req) => json!({"outcome": "requested", "request": req}),
        Outcome::Exhausted { iteration, results } => json!({
            "outcome": "exhausted",
            "iteration": iteration,
            "results": results,
        }),
    }
}
