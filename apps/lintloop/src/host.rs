//! Concrete collaborators for running the engine from a terminal.
//!
//! - changed files: `git diff --name-only` or an explicit list
//! - conversation: a JSON transcript file (array of messages)
//! - notifications: prefixed lines on stderr

use crate::controller::{Host, NoticeLevel};
use crate::history::Message;
use crate::utils;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Files changed in the working tree relative to the index.
///
/// Any git failure yields an empty list, which makes the run a no-op.
pub fn git_changed_files(root: &Path) -> Vec<String> {
    let output = Command::new("git")
        .args(["diff", "--name-only"])
        .current_dir(root)
        .output();
    match output {
        Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        Ok(o) => {
            tracing::warn!(status = %o.status, "git diff failed; treating as no changes");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "git not available; treating as no changes");
            Vec::new()
        }
    }
}

/// Conversation persisted as a JSON array of [`Message`] values.
#[derive(Debug, Clone)]
pub struct TranscriptFile {
    path: PathBuf,
}

impl TranscriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all messages. A missing file is an empty conversation.
    pub fn read(&self) -> Result<Vec<Message>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading transcript {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing transcript {}", self.path.display()))
    }

    /// Append one message, keeping every earlier message untouched.
    pub fn append(&self, message: Message) -> Result<()> {
        let mut messages = self.read()?;
        messages.push(message);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let body = serde_json::to_string_pretty(&messages)?;
        fs::write(&self.path, body)
            .with_context(|| format!("writing transcript {}", self.path.display()))
    }
}

/// Host used by the `run` command.
pub struct CliHost {
    root: PathBuf,
    files: Option<Vec<String>>,
    transcript: Option<TranscriptFile>,
    quiet: bool,
}

impl CliHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: None,
            transcript: None,
            quiet: false,
        }
    }

    /// Use an explicit changed-file list instead of asking git.
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_transcript(mut self, transcript: TranscriptFile) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Suppress notices on stderr (JSON output mode).
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl Host for CliHost {
    fn changed_files(&self) -> Vec<String> {
        match &self.files {
            Some(f) => f.clone(),
            None => git_changed_files(&self.root),
        }
    }

    fn history(&self) -> Result<Vec<Message>> {
        match &self.transcript {
            Some(t) => t.read(),
            None => Ok(Vec::new()),
        }
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        if let Some(t) = &self.transcript {
            t.append(Message::user_text(text))?;
        }
        Ok(())
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = match level {
            NoticeLevel::Info => utils::info_prefix(),
            NoticeLevel::Success => utils::success_prefix(),
            NoticeLevel::Error => utils::error_prefix(),
        };
        eprintln!("{} {}", prefix, message);
    }
}
