//! lintloop CLI binary entry point.
//! Delegates to the library modules and prints results.

use clap::Parser;
use lintloop::cli::{Cli, Commands, ProjectArgs};
use lintloop::config::{self, Config, Effective};
use lintloop::controller::FixLoop;
use lintloop::detector::applicable_targets;
use lintloop::host::{git_changed_files, CliHost, TranscriptFile};
use lintloop::runner::{LintRunner, ShellRunner};
use lintloop::{output, parsers, utils};
use std::io::Read;
use std::path::{Path, PathBuf};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve(project: &ProjectArgs) -> Effective {
    config::resolve_effective(
        project.repo_root.as_deref(),
        project.config.as_deref(),
        project.output.as_deref(),
    )
}

/// Load the configuration or exit with status 2.
fn require_config(eff: &Effective) -> Config {
    match eff.load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            eprintln!(
                "{} No lintloop configuration found under {}.",
                utils::error_prefix(),
                eff.repo_root.display()
            );
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    }
}

fn transcript_path(root: &Path, raw: &str) -> PathBuf {
    let p = PathBuf::from(raw);
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Run {
            project,
            transcript,
            files,
        } => {
            let eff = resolve(&project);
            // A missing or broken configuration leaves the engine inert.
            let cfg = match eff.load() {
                Ok(Some(cfg)) => cfg,
                Ok(None) => {
                    tracing::info!(root = %eff.repo_root.display(), "no configuration; nothing to do");
                    return;
                }
                Err(e) => {
                    tracing::error!(error = %e, "invalid configuration; lint loop disabled");
                    return;
                }
            };
            let mut host = CliHost::new(&eff.repo_root).quiet(eff.output == "json");
            if let Some(f) = files {
                host = host.with_files(f);
            }
            if let Some(t) = transcript {
                host = host.with_transcript(TranscriptFile::new(transcript_path(&eff.repo_root, &t)));
            }
            let outcome = FixLoop::new(&cfg, ShellRunner, &eff.repo_root).run(&mut host);
            output::print_outcome(&outcome, &eff.output);
            if outcome.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Check { project, files } => {
            let eff = resolve(&project);
            let cfg = require_config(&eff);
            let files = files.unwrap_or_else(|| git_changed_files(&eff.repo_root));
            let targets = applicable_targets(&files, &cfg.targets);
            if targets.is_empty() && eff.output != "json" {
                eprintln!("{} No lint target matches the changed files.", utils::note_prefix());
            }
            let results: Vec<_> = targets
                .iter()
                .map(|t| ShellRunner.check(t, &eff.repo_root))
                .collect();
            output::print_results(&results, &eff.output);
            if results.iter().any(|r| !r.is_clean()) {
                std::process::exit(1);
            }
        }
        Commands::Match { project, files } => {
            let eff = resolve(&project);
            let cfg = require_config(&eff);
            let targets = applicable_targets(&files, &cfg.targets);
            if eff.output == "json" {
                match serde_json::to_string_pretty(&targets) {
                    Ok(s) => println!("{}", s),
                    Err(e) => tracing::error!(error = %e, "failed to render targets"),
                }
            } else {
                for t in targets {
                    println!("{}\t{}", t.ecosystem, t.pattern);
                }
            }
        }
        Commands::Parse {
            ecosystem,
            root_dir,
        } => {
            let mut raw = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
                eprintln!("{} failed to read stdin: {}", utils::error_prefix(), e);
                std::process::exit(2);
            }
            let errors = parsers::parse_tagged(&ecosystem, &raw, &root_dir);
            output::print_errors(&errors);
        }
    }
}
