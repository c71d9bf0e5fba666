//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lintloop",
    version,
    about = "Detect, auto-fix and re-verify lint issues for a change set",
    long_about = "lintloop — matches changed files to lint targets, runs each target's check and fix commands, and decides whether to request another fix attempt.\n\nConfiguration: .lintloop/lint-fix.json, lintloop.toml or lintloop.yaml at the repository root.",
    after_help = "Examples:\n  lintloop run --transcript .lintloop/session.json\n  lintloop check --files src/index.ts\n  lintloop match --files src/a.ts main.go\n  cargo clippy --message-format=json | lintloop parse --ecosystem rust",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Debug, Default)]
/// Options shared by commands that need the project configuration.
pub struct ProjectArgs {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Config file (default: discovered at the repository root)")]
    pub config: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current lintloop version.")]
    Version,
    /// One detect/fix/re-check pass with an iteration decision
    #[command(
        about = "Run one fix iteration",
        long_about = "Check matched targets, run fix commands where needed, re-check, then either pass, emit a fix request, or report that the iteration budget is spent.",
        after_help = "Exit status: 0 when clean or skipped, 1 when lint errors remain."
    )]
    Run {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long, help = "Conversation transcript (JSON array of messages)")]
        transcript: Option<String>,
        #[arg(long, num_args = 1.., help = "Changed files (default: git diff --name-only)")]
        files: Option<Vec<String>>,
    },
    /// Check matched targets without fixing
    #[command(
        about = "Run check commands only",
        long_about = "Run the check command of every target matched by the changed files and print the parsed diagnostics."
    )]
    Check {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long, num_args = 1.., help = "Changed files (default: git diff --name-only)")]
        files: Option<Vec<String>>,
    },
    /// Show which targets the given files trigger
    #[command(about = "Match files to targets")]
    Match {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long, num_args = 1.., required = true, help = "Changed files")]
        files: Vec<String>,
    },
    /// Parse tool output from stdin into canonical diagnostics
    #[command(
        about = "Parse linter output",
        long_about = "Read raw linter output on stdin and print canonical diagnostics as JSON. Unknown ecosystems and unparseable input print an empty list."
    )]
    Parse {
        #[arg(long, help = "Ecosystem tag: js|go|rust")]
        ecosystem: String,
        #[arg(long, default_value = "", help = "Project root stripped from ESLint file paths")]
        root_dir: String,
    },
}
