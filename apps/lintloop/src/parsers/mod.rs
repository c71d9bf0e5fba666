//! Tool output parsers.
//!
//! Each submodule converts one toolchain's raw output into canonical
//! [`LintError`] records. Parsers never fail: unusable input yields an
//! empty list and a log event.

pub mod clippy;
pub mod eslint;
pub mod golangci;

use crate::models::{Ecosystem, LintError};

/// Parse `output` according to the wire format of `ecosystem`.
pub fn parse_output(ecosystem: Ecosystem, output: &str, root_dir: &str) -> Vec<LintError> {
    match ecosystem {
        Ecosystem::Js => eslint::parse(output, root_dir),
        Ecosystem::Go => golangci::parse(output),
        Ecosystem::Rust => clippy::parse(output),
    }
}

/// Parse by configuration tag; unknown tags produce no diagnostics.
pub fn parse_tagged(tag: &str, output: &str, root_dir: &str) -> Vec<LintError> {
    match Ecosystem::from_tag(tag) {
        Some(eco) => parse_output(eco, output, root_dir),
        None => {
            tracing::debug!(tag, "no parser for ecosystem");
            Vec::new()
        }
    }
}
