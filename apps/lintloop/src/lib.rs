//! lintloop core library.
//!
//! This crate exposes programmatic APIs for running a bounded
//! "check → fix → re-check → escalate" loop over lint targets.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery, loading and validation of the target list.
//! - `detector`: Changed-file to target matching.
//! - `parsers`: ESLint / golangci-lint / clippy output parsers.
//! - `runner`: Shell execution of check and fix commands.
//! - `history`: Conversation transcript model and attempt counting.
//! - `controller`: The per-run iteration decision.
//! - `host`: git, transcript-file and terminal collaborators.
//! - `models`: Shared data models.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod controller;
pub mod detector;
pub mod history;
pub mod host;
pub mod models;
pub mod output;
pub mod parsers;
pub mod runner;
pub mod utils;
