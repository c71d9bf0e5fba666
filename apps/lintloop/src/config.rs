//! Configuration discovery, loading and validation.
//!
//! lintloop reads its configuration from the repository root (or closest
//! ancestor). Candidates, first found wins:
//! - `.lintloop/lint-fix.json`
//! - `lintloop.toml`
//! - `lintloop.yaml` / `lintloop.yml`
//!
//! Defaults:
//! - `maxIterations`: 3
//! - `parallel`: false
//!
//! Overrides precedence: CLI `--config` > discovered file.

use crate::detector::compile_pattern;
use crate::models::LintTarget;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Discovery candidates relative to the repository root, in priority order.
pub const CONFIG_CANDIDATES: [&str; 4] = [
    ".lintloop/lint-fix.json",
    "lintloop.toml",
    "lintloop.yaml",
    "lintloop.yml",
];

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Root configuration consumed by the engine as plain data.
pub struct Config {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Run per-target check/fix cycles on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    pub targets: Vec<LintTarget>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },
    #[error("invalid TOML in {path}: {message}")]
    Toml { path: PathBuf, message: String },
    #[error("invalid YAML in {path}: {message}")]
    Yaml { path: PathBuf, message: String },
    #[error("maxIterations must be at least 1 (got {0})")]
    MaxIterations(u32),
    #[error("target #{index} ({pattern}): {field} command is empty")]
    EmptyCommand {
        index: usize,
        pattern: String,
        field: &'static str,
    },
    #[error("target #{index}: invalid glob pattern '{pattern}': {message}")]
    Pattern {
        index: usize,
        pattern: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::Toml,
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl Config {
    /// Reject configurations the engine cannot act on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations < 1 {
            return Err(ConfigError::MaxIterations(self.max_iterations));
        }
        for (index, t) in self.targets.iter().enumerate() {
            if let Err(e) = compile_pattern(&t.pattern) {
                return Err(ConfigError::Pattern {
                    index,
                    pattern: t.pattern.clone(),
                    message: e.kind().to_string(),
                });
            }
            for (field, cmd) in [("check", &t.check), ("fix", &t.fix)] {
                if cmd.trim().is_empty() {
                    return Err(ConfigError::EmptyCommand {
                        index,
                        pattern: t.pattern.clone(),
                        field,
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse `raw` as the format implied by `path`, then validate.
    pub fn from_str_for(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let cfg: Config = match Format::from_path(path) {
            Format::Json => serde_json::from_str(raw).map_err(|e| ConfigError::Json {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            Format::Toml => toml::from_str(raw).map_err(|e| ConfigError::Toml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            Format::Yaml => serde_yaml::from_str(raw).map_err(|e| ConfigError::Yaml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a configuration file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str_for(path, &raw)
    }
}

/// First existing configuration candidate under `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|c| root.join(c))
        .find(|p| p.is_file())
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a configuration candidate or a `.git` entry is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if find_config(cur).is_some() || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load the configuration for `root`. `Ok(None)` when no file exists.
pub fn load_config(root: &Path) -> Result<Option<Config>, ConfigError> {
    match find_config(root) {
        Some(p) => Config::load_file(&p).map(Some),
        None => Ok(None),
    }
}

#[derive(Debug, Clone)]
/// Settings resolved from CLI flags and discovery.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub output: String,
}

/// Resolve `Effective` by merging CLI flags with discovery.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_config: Option<&str>,
    cli_output: Option<&str>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let start = start.canonicalize().unwrap_or(start);
    let repo_root = detect_repo_root(&start);
    let config_path = match cli_config {
        Some(c) => {
            let p = PathBuf::from(c);
            Some(if p.is_absolute() { p } else { repo_root.join(p) })
        }
        None => find_config(&repo_root),
    };
    let output = cli_output
        .map(|s| s.to_string())
        .unwrap_or_else(|| "human".to_string());
    Effective {
        repo_root,
        config_path,
        output,
    }
}

impl Effective {
    /// Load the resolved configuration file, if any.
    pub fn load(&self) -> Result<Option<Config>, ConfigError> {
        match &self.config_path {
            Some(p) => Config::load_file(p).map(Some),
            None => Ok(None),
        }
    }
}
