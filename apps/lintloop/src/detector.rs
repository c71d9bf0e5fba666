//! Changed-file to lint-target matching.
//!
//! Each file triggers at most one target: the first one, in configured
//! order, whose glob matches it. The result lists every triggered target
//! once, in configured order.

use crate::models::LintTarget;
use globset::{GlobBuilder, GlobMatcher};

/// Compile a target pattern: `*` and `?` stay within a segment, `**` spans
/// segments, `{a,b}` alternates.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
}

/// Targets with their compiled patterns.
pub struct TargetMatcher<'a> {
    compiled: Vec<(&'a LintTarget, Option<GlobMatcher>)>,
}

impl<'a> TargetMatcher<'a> {
    pub fn new(targets: &'a [LintTarget]) -> Self {
        let compiled = targets
            .iter()
            .map(|t| {
                let pat = match compile_pattern(&t.pattern) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!(pattern = %t.pattern, error = %e, "invalid target pattern; it will never match");
                        None
                    }
                };
                (t, pat)
            })
            .collect();
        Self { compiled }
    }

    /// Index of the first target whose pattern matches `file`.
    fn first_match(&self, file: &str) -> Option<usize> {
        let file = file.strip_prefix("./").unwrap_or(file);
        self.compiled.iter().position(|(_, pat)| {
            pat.as_ref()
                .map(|p| p.is_match(file))
                .unwrap_or(false)
        })
    }

    /// Distinct targets triggered by at least one of `files`.
    pub fn matches<S: AsRef<str>>(&self, files: &[S]) -> Vec<&'a LintTarget> {
        let mut hit = vec![false; self.compiled.len()];
        for f in files {
            if let Some(i) = self.first_match(f.as_ref()) {
                hit[i] = true;
            }
        }
        self.compiled
            .iter()
            .zip(hit)
            .filter_map(|((t, _), h)| h.then_some(*t))
            .collect()
    }
}

/// Convenience wrapper over [`TargetMatcher`].
pub fn applicable_targets<'a, S: AsRef<str>>(
    files: &[S],
    targets: &'a [LintTarget],
) -> Vec<&'a LintTarget> {
    if files.is_empty() || targets.is_empty() {
        return Vec::new();
    }
    let found = TargetMatcher::new(targets).matches(files);
    tracing::debug!(files = files.len(), matched = found.len(), "matched lint targets");
    found
}
