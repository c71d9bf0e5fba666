//! Fix iteration controller.
//!
//! One call to [`FixLoop::run`] is one pass of
//! detect → match → check → fix → re-check → decide. Nothing survives the
//! call: the next run recounts prior attempts from the conversation.

use crate::config::Config;
use crate::detector::applicable_targets;
use crate::history::{derive_state, Message};
use crate::models::{FixRequest, IterationState, LintResult, LintTarget};
use crate::runner::LintRunner;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub const NOTICE_STARTED: &str = "Running lint checks...";
pub const NOTICE_PASSED: &str = "Lint passed ✓";
pub const NOTICE_EXHAUSTED: &str = "Lint failed after retries";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Collaborators owned by whatever hosts the engine.
pub trait Host {
    /// Changed-file paths relative to the project root.
    fn changed_files(&self) -> Vec<String>;

    /// Conversation messages so far. An absent conversation is empty; an
    /// unreadable one is an error.
    fn history(&self) -> anyhow::Result<Vec<Message>>;

    /// Send a follow-up instruction into the conversation.
    fn prompt(&mut self, text: &str) -> anyhow::Result<()>;

    fn notify(&mut self, level: NoticeLevel, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Why a run stopped before doing any lint work.
pub enum SkipReason {
    NoChanges,
    NoTargets,
    /// Prior attempts cannot be counted, so no request may be sent.
    HistoryUnavailable,
    BudgetExhausted { prior_attempts: u32 },
}

#[derive(Debug, Clone, PartialEq)]
/// Terminal state of one run.
pub enum Outcome {
    Skipped(SkipReason),
    /// Every matched target ended clean.
    Passed,
    /// Errors remain and another attempt was requested.
    Requested(FixRequest),
    /// Errors remain and the iteration budget is spent.
    Exhausted {
        iteration: u32,
        results: Vec<LintResult>,
    },
}

impl Outcome {
    /// Whether errors were left outstanding by this run.
    pub fn has_errors(&self) -> bool {
        matches!(self, Self::Requested(_) | Self::Exhausted { .. })
    }
}

/// Run one check → maybe fix → re-check cycle for a single target.
///
/// Returns the final result when it still carries errors.
pub fn check_fix_recheck<R: LintRunner + ?Sized>(
    runner: &R,
    target: &LintTarget,
    root: &Path,
) -> Option<LintResult> {
    let first = runner.check(target, root);
    if first.is_clean() {
        tracing::debug!(pattern = %target.pattern, "target clean on first check");
        return None;
    }
    tracing::info!(
        pattern = %target.pattern,
        errors = first.summary().total(),
        fixable = first.summary().fixable(),
        "running fix command"
    );
    runner.fix(target, root);
    let second = runner.check(target, root);
    if second.is_clean() {
        None
    } else {
        Some(second)
    }
}

/// Drives one run over the configured targets.
pub struct FixLoop<'a, R: LintRunner> {
    config: &'a Config,
    runner: R,
    root: PathBuf,
}

impl<'a, R: LintRunner> FixLoop<'a, R> {
    pub fn new(config: &'a Config, runner: R, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            runner,
            root: root.into(),
        }
    }

    /// Check/fix every target, keeping only those that still have errors.
    /// Results keep the order of `targets`.
    fn collect_failing(&self, targets: &[&LintTarget]) -> Vec<LintResult> {
        if self.config.parallel {
            targets
                .par_iter()
                .filter_map(|t| check_fix_recheck(&self.runner, t, &self.root))
                .collect()
        } else {
            targets
                .iter()
                .filter_map(|t| check_fix_recheck(&self.runner, t, &self.root))
                .collect()
        }
    }

    pub fn run<H: Host + ?Sized>(&self, host: &mut H) -> Outcome {
        let files = host.changed_files();
        if files.is_empty() {
            tracing::debug!("no changed files");
            return Outcome::Skipped(SkipReason::NoChanges);
        }

        let targets = applicable_targets(&files, &self.config.targets);
        if targets.is_empty() {
            tracing::debug!(files = files.len(), "no lint target matches the changed files");
            return Outcome::Skipped(SkipReason::NoTargets);
        }

        let history = match host.history() {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "conversation history unreadable; skipping");
                return Outcome::Skipped(SkipReason::HistoryUnavailable);
            }
        };
        let state = derive_state(&history, self.config.max_iterations);
        if state.is_exhausted() {
            tracing::info!(
                prior_attempts = state.prior_attempts,
                max_iterations = state.max_iterations,
                "iteration budget already spent; skipping"
            );
            return Outcome::Skipped(SkipReason::BudgetExhausted {
                prior_attempts: state.prior_attempts,
            });
        }

        host.notify(NoticeLevel::Info, NOTICE_STARTED);
        let failing = self.collect_failing(&targets);
        self.decide(host, state, failing)
    }

    fn decide<H: Host + ?Sized>(
        &self,
        host: &mut H,
        state: IterationState,
        failing: Vec<LintResult>,
    ) -> Outcome {
        if failing.is_empty() {
            host.notify(NoticeLevel::Success, NOTICE_PASSED);
            return Outcome::Passed;
        }

        let iteration = state.next_iteration();
        if state.can_request() {
            let request = FixRequest::new(state, failing);
            tracing::info!(
                iteration,
                max_iterations = state.max_iterations,
                targets = request.results.len(),
                "requesting another fix attempt"
            );
            if let Err(e) = host.prompt(&request.to_payload()) {
                tracing::warn!(error = %e, "failed to send fix request");
            }
            Outcome::Requested(request)
        } else {
            tracing::info!(iteration, targets = failing.len(), "lint errors remain after final attempt");
            host.notify(NoticeLevel::Error, NOTICE_EXHAUSTED);
            Outcome::Exhausted {
                iteration,
                results: failing,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ecosystem, LintError, Severity};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted runner: each check pops the next error count for the
    /// target's pattern; an exhausted script means clean.
    struct ScriptedRunner {
        checks: Mutex<HashMap<String, Vec<usize>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(script: &[(&str, &[usize])]) -> Self {
            let checks = script
                .iter()
                .map(|(p, counts)| (p.to_string(), counts.iter().rev().copied().collect()))
                .collect();
            Self {
                checks: Mutex::new(checks),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn errors(n: usize) -> Vec<LintError> {
        (0..n)
            .map(|i| LintError {
                file: format!("f{}.ts", i),
                line: 1,
                column: 1,
                rule: "r".into(),
                severity: Severity::Error,
                message: "m".into(),
                fixable: i % 2 == 0,
            })
            .collect()
    }

    impl LintRunner for ScriptedRunner {
        fn check(&self, target: &LintTarget, _root: &Path) -> LintResult {
            self.calls.lock().unwrap().push(format!("check {}", target.pattern));
            let n = self
                .checks
                .lock()
                .unwrap()
                .get_mut(&target.pattern)
                .and_then(|v| v.pop())
                .unwrap_or(0);
            LintResult::new(target.ecosystem, target.pattern.clone(), errors(n))
        }

        fn fix(&self, target: &LintTarget, _root: &Path) {
            self.calls.lock().unwrap().push(format!("fix {}", target.pattern));
        }
    }

    #[derive(Default)]
    struct FakeHost {
        files: Vec<String>,
        history: Vec<Message>,
        prompts: Vec<String>,
        notices: Vec<(NoticeLevel, String)>,
    }

    impl Host for FakeHost {
        fn changed_files(&self) -> Vec<String> {
            self.files.clone()
        }

        fn history(&self) -> anyhow::Result<Vec<Message>> {
            Ok(self.history.clone())
        }

        fn prompt(&mut self, text: &str) -> anyhow::Result<()> {
            self.prompts.push(text.to_string());
            self.history.push(Message::user_text(text));
            Ok(())
        }

        fn notify(&mut self, level: NoticeLevel, message: &str) {
            self.notices.push((level, message.to_string()));
        }
    }

    fn target(pattern: &str, eco: Ecosystem) -> LintTarget {
        LintTarget {
            pattern: pattern.into(),
            ecosystem: eco,
            check: "check".into(),
            fix: "fix".into(),
        }
    }

    fn config(max_iterations: u32, parallel: bool) -> Config {
        Config {
            max_iterations,
            parallel,
            targets: vec![target("src/**/*.ts", Ecosystem::Js), target("**/*.go", Ecosystem::Go)],
        }
    }

    fn host(files: &[&str]) -> FakeHost {
        FakeHost {
            files: files.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_changes_and_no_targets_are_noops() {
        let cfg = config(3, false);
        let runner = ScriptedRunner::new(&[]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&[]);
        assert_eq!(lp.run(&mut h), Outcome::Skipped(SkipReason::NoChanges));
        let mut h = host(&["docs/readme.md"]);
        assert_eq!(lp.run(&mut h), Outcome::Skipped(SkipReason::NoTargets));
        assert!(h.notices.is_empty());
        assert!(lp.runner.calls().is_empty());
    }

    #[test]
    fn test_clean_target_is_not_fixed_or_reported() {
        let cfg = config(3, false);
        let runner = ScriptedRunner::new(&[("src/**/*.ts", &[0]), ("**/*.go", &[2, 1])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&["src/a.ts", "main.go"]);
        let out = lp.run(&mut h);
        assert_eq!(
            lp.runner.calls(),
            vec!["check src/**/*.ts", "check **/*.go", "fix **/*.go", "check **/*.go"]
        );
        match out {
            Outcome::Requested(req) => {
                assert_eq!(req.iteration, 1);
                assert_eq!(req.max_iterations, 3);
                assert_eq!(req.results.len(), 1);
                assert_eq!(req.results[0].target(), "**/*.go");
                // the post-fix result replaces the pre-fix one
                assert_eq!(req.results[0].summary().total(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.prompts.len(), 1);
        assert!(h.prompts[0].contains(r#""task":"fix_lint_errors""#));
        assert_eq!(h.notices, vec![(NoticeLevel::Info, NOTICE_STARTED.to_string())]);
    }

    #[test]
    fn test_fix_that_clears_errors_passes() {
        let cfg = config(3, false);
        let runner = ScriptedRunner::new(&[("src/**/*.ts", &[4, 0])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&["src/x/y.ts"]);
        assert_eq!(lp.run(&mut h), Outcome::Passed);
        assert_eq!(h.notices.last().unwrap().0, NoticeLevel::Success);
        assert!(h.prompts.is_empty());
    }

    #[test]
    fn test_budget_exhausted_runs_no_commands() {
        let cfg = config(2, false);
        let runner = ScriptedRunner::new(&[("src/**/*.ts", &[1, 1])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&["src/a.ts"]);
        h.history.push(Message::user_text(r#"{"task":"fix_lint_errors","iteration":1}"#));
        h.history.push(Message::user_text(r#"{"task":"fix_lint_errors","iteration":2}"#));
        assert_eq!(
            lp.run(&mut h),
            Outcome::Skipped(SkipReason::BudgetExhausted { prior_attempts: 2 })
        );
        assert!(lp.runner.calls().is_empty());
        assert!(h.notices.is_empty());
    }

    #[test]
    fn test_loop_requests_until_budget_then_reports_failure() {
        let cfg = config(3, false);
        // errors persist through every check
        let runner = ScriptedRunner::new(&[("src/**/*.ts", &[1; 16])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&["src/a.ts"]);

        let first = lp.run(&mut h);
        assert!(matches!(&first, Outcome::Requested(r) if r.iteration == 1));
        let second = lp.run(&mut h);
        assert!(matches!(&second, Outcome::Requested(r) if r.iteration == 2));
        let third = lp.run(&mut h);
        match third {
            Outcome::Exhausted { iteration, results } => {
                assert_eq!(iteration, 3);
                assert_eq!(results.len(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.prompts.len(), 2);
        assert_eq!(
            h.notices.last().unwrap(),
            &(NoticeLevel::Error, NOTICE_EXHAUSTED.to_string())
        );
        // the failure notice is not a request, so a later run still has budget
        assert!(lp.run(&mut h).has_errors());
    }

    #[test]
    fn test_single_iteration_budget_never_requests() {
        let cfg = config(1, false);
        let runner = ScriptedRunner::new(&[("**/*.go", &[3, 3])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&["cmd/main.go"]);
        assert!(matches!(lp.run(&mut h), Outcome::Exhausted { iteration: 1, .. }));
        assert!(h.prompts.is_empty());
    }

    #[test]
    fn test_parallel_pass_keeps_matcher_order() {
        let cfg = config(3, true);
        let runner = ScriptedRunner::new(&[("src/**/*.ts", &[2, 2]), ("**/*.go", &[1, 1])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = host(&["main.go", "src/a.ts"]);
        match lp.run(&mut h) {
            Outcome::Requested(req) => {
                let pats: Vec<_> = req.results.iter().map(|r| r.target().to_string()).collect();
                assert_eq!(pats, vec!["src/**/*.ts", "**/*.go"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // per target: check, fix, check, in that order
        let calls = lp.runner.calls();
        for pat in ["src/**/*.ts", "**/*.go"] {
            let mine: Vec<_> = calls.iter().filter(|c| c.ends_with(pat)).cloned().collect();
            assert_eq!(
                mine,
                vec![format!("check {}", pat), format!("fix {}", pat), format!("check {}", pat)]
            );
        }
    }

    #[test]
    fn test_shell_fix_clears_errors_end_to_end() {
        use crate::runner::ShellRunner;
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("dirty"), "").unwrap();
        let issue = r#"{"Issues":[{"FromLinter":"vet","Text":"bad","Pos":{"Filename":"main.go","Line":1,"Column":1}}]}"#;
        let cfg = Config {
            max_iterations: 3,
            parallel: false,
            targets: vec![LintTarget {
                pattern: "**/*.go".into(),
                ecosystem: Ecosystem::Go,
                check: format!("if [ -f dirty ]; then echo '{}'; exit 1; fi; echo '{{\"Issues\":[]}}'", issue),
                fix: "rm dirty".into(),
            }],
        };
        let lp = FixLoop::new(&cfg, ShellRunner, tmp.path());
        let mut h = host(&["main.go"]);
        assert_eq!(lp.run(&mut h), Outcome::Passed);
        assert!(!tmp.path().join("dirty").exists());
    }

    #[test]
    fn test_prompt_failure_does_not_abort_run() {
        struct DeafHost(FakeHost);
        impl Host for DeafHost {
            fn changed_files(&self) -> Vec<String> {
                self.0.changed_files()
            }
            fn history(&self) -> anyhow::Result<Vec<Message>> {
                Ok(Vec::new())
            }
            fn prompt(&mut self, _text: &str) -> anyhow::Result<()> {
                anyhow::bail!("session closed")
            }
            fn notify(&mut self, level: NoticeLevel, message: &str) {
                self.0.notify(level, message)
            }
        }
        let cfg = config(3, false);
        let runner = ScriptedRunner::new(&[("src/**/*.ts", &[1, 1])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = DeafHost(host(&["src/a.ts"]));
        assert!(matches!(lp.run(&mut h), Outcome::Requested(_)));
    }

    #[test]
    fn test_unreadable_history_never_requests() {
        struct GarbledHost(FakeHost);
        impl Host for GarbledHost {
            fn changed_files(&self) -> Vec<String> {
                self.0.changed_files()
            }
            fn history(&self) -> anyhow::Result<Vec<Message>> {
                anyhow::bail!("parsing transcript t.json: expected value")
            }
            fn prompt(&mut self, text: &str) -> anyhow::Result<()> {
                self.0.prompt(text)
            }
            fn notify(&mut self, level: NoticeLevel, message: &str) {
                self.0.notify(level, message)
            }
        }
        let cfg = config(2, false);
        let runner = ScriptedRunner::new(&[("**/*.go", &[1; 16])]);
        let lp = FixLoop::new(&cfg, runner, "/repo");
        let mut h = GarbledHost(host(&["main.go"]));
        for _ in 0..5 {
            assert_eq!(lp.run(&mut h), Outcome::Skipped(SkipReason::HistoryUnavailable));
        }
        assert!(h.0.prompts.is_empty());
        assert!(lp.runner.calls().is_empty());
    }
}
