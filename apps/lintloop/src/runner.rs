//! Check/fix command execution.
//!
//! Lint tools exit non-zero when they report diagnostics, so exit status is
//! not a failure signal here. Only a command that could not run at all
//! (spawn failure, signal, shell "not found"/"not executable") takes the
//! unverified path.

use crate::models::{LintResult, LintTarget};
use crate::parsers::parse_output;
use std::path::Path;
use std::process::Command;

/// Shell exit codes meaning the command itself never ran.
const NOT_EXECUTABLE: i32 = 126;
const NOT_FOUND: i32 = 127;

/// Captured outcome of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The command ran; `code` is its exit status, whatever it was.
    Completed {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The command could not be executed.
    Failed {
        reason: String,
        stdout: String,
        stderr: String,
    },
}

impl ExecOutcome {
    /// Output to hand to a parser: stdout, or stderr when stdout is blank.
    pub fn diagnostics_text(&self) -> &str {
        let (stdout, stderr) = match self {
            Self::Completed { stdout, stderr, .. } | Self::Failed { stdout, stderr, .. } => {
                (stdout, stderr)
            }
        };
        if stdout.trim().is_empty() {
            stderr
        } else {
            stdout
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Run `command` through `sh -c` in `root_dir`, capturing both streams.
pub fn run_shell(command: &str, root_dir: &Path) -> ExecOutcome {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(root_dir)
        .output();
    match output {
        Ok(out) => {
            let stdout = String::from_utf8_lossy(&out.stdout).to_string();
            let stderr = String::from_utf8_lossy(&out.stderr).to_string();
            match out.status.code() {
                Some(NOT_EXECUTABLE) | Some(NOT_FOUND) => ExecOutcome::Failed {
                    reason: format!("command could not be executed (exit {})", out.status),
                    stdout,
                    stderr,
                },
                Some(code) => ExecOutcome::Completed {
                    code,
                    stdout,
                    stderr,
                },
                None => ExecOutcome::Failed {
                    reason: format!("terminated by signal ({})", out.status),
                    stdout,
                    stderr,
                },
            }
        }
        Err(e) => ExecOutcome::Failed {
            reason: format!("failed to spawn shell: {}", e),
            stdout: String::new(),
            stderr: String::new(),
        },
    }
}

/// Executes the check and fix commands of a target.
///
/// `Sync` so the controller may drive several targets in parallel.
pub trait LintRunner: Sync {
    /// Run the check command and parse its diagnostics.
    fn check(&self, target: &LintTarget, root_dir: &Path) -> LintResult;

    /// Run the fix command. Failures are swallowed; callers always re-check.
    fn fix(&self, target: &LintTarget, root_dir: &Path);
}

/// [`LintRunner`] backed by the system shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl LintRunner for ShellRunner {
    fn check(&self, target: &LintTarget, root_dir: &Path) -> LintResult {
        let outcome = run_shell(&target.check, root_dir);
        let root = root_dir.to_string_lossy();
        let errors = parse_output(target.ecosystem, outcome.diagnostics_text(), &root);
        match &outcome {
            ExecOutcome::Completed { code, .. } => {
                tracing::debug!(
                    pattern = %target.pattern,
                    ecosystem = %target.ecosystem,
                    code,
                    errors = errors.len(),
                    "check finished"
                );
                LintResult::new(target.ecosystem, target.pattern.clone(), errors)
            }
            ExecOutcome::Failed { reason, .. } => {
                tracing::warn!(
                    pattern = %target.pattern,
                    command = %target.check,
                    reason = %reason,
                    errors = errors.len(),
                    "check command failed to execute"
                );
                LintResult::unverified(target.ecosystem, target.pattern.clone(), errors)
            }
        }
    }

    fn fix(&self, target: &LintTarget, root_dir: &Path) {
        match run_shell(&target.fix, root_dir) {
            ExecOutcome::Completed { code: 0, .. } => {
                tracing::debug!(pattern = %target.pattern, "fix command succeeded");
            }
            ExecOutcome::Completed { code, .. } => {
                tracing::debug!(pattern = %target.pattern, code, "fix command exited non-zero");
            }
            ExecOutcome::Failed { reason, .. } => {
                tracing::debug!(pattern = %target.pattern, reason = %reason, "fix command failed");
            }
        }
    }
}
