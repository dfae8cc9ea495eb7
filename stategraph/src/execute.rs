//! Execution phase: run a frozen [`Suite`] case by case.
//!
//! Cases run depth-first in emission order on the calling thread. Each case is
//! isolated: a failing or panicking step fails only its own case, and the next
//! case runs regardless.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe, catch_unwind};
use std::sync::Once;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::core::case::CaseBody;
use crate::core::error::CaseFailure;
use crate::report::{CaseOutcome, CaseRecord, RunReport};
use crate::suite::Suite;

/// Collaborator that prepares the application before any case runs.
pub trait Environment {
    fn install(&self) -> Result<()>;
}

/// Environment with nothing to install.
pub struct NoEnvironment;

impl Environment for NoEnvironment {
    fn install(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Only cases whose `scope/.../case` path matches run; others are skipped.
    pub filter: Option<Regex>,
}

/// Install `env`, then run every case in `suite`.
///
/// Returns an error only when the environment cannot be installed; case
/// failures are recorded in the report.
#[instrument(skip_all, fields(filter = ?options.filter.as_ref().map(Regex::as_str)))]
pub fn execute_suite(
    suite: &Suite,
    env: &dyn Environment,
    options: &ExecOptions,
) -> Result<RunReport> {
    env.install().context("install test environment")?;
    let _quiet = QuietPanics::install();

    let started_at = Utc::now();
    let start = Instant::now();
    let mut cases = Vec::with_capacity(suite.case_count());

    suite.for_each_case(|case| {
        let path = case.path();
        let selected = options
            .filter
            .as_ref()
            .is_none_or(|filter| filter.is_match(&path));

        let case_start = Instant::now();
        let outcome = if selected {
            match run_case(case.body) {
                Ok(()) => {
                    debug!(case = %path, "case passed");
                    CaseOutcome::Passed
                }
                Err(failure) => {
                    warn!(case = %path, kind = %failure.kind, step = %failure.step, "case failed");
                    CaseOutcome::Failed { failure }
                }
            }
        } else {
            debug!(case = %path, "case skipped by filter");
            CaseOutcome::Skipped
        };

        cases.push(CaseRecord {
            path: case.scopes,
            name: case.name.to_string(),
            kind: case.body.kind(),
            outcome,
            duration_ms: elapsed_ms(case_start),
        });
    });

    let report = RunReport {
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        duration_ms: elapsed_ms(start),
        cases,
    };
    let summary = report.summary();
    info!(
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "suite finished"
    );
    Ok(report)
}

/// Run a case's steps in order, stopping at the first failure.
///
/// Errors and panics are attributed to the step that raised them.
pub fn run_case(body: &CaseBody) -> Result<(), CaseFailure> {
    for step in body.steps() {
        let result = catch_unwind(AssertUnwindSafe(|| step.action.run()));
        let message = match result {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        return Err(CaseFailure {
            kind: step.kind,
            step: step.action.label().to_string(),
            message,
        });
    }
    Ok(())
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Routes panics on the current thread to a `debug!` event until dropped, so
/// panicking actions show up in the report rather than as raw stderr output.
///
/// The process-wide hook is wrapped once; other threads keep the previous
/// hook's behavior.
struct QuietPanics {
    was_quiet: bool,
}

impl QuietPanics {
    fn install() -> Self {
        PANIC_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if QUIET_PANICS.with(Cell::get) {
                    debug!(%info, "action panicked");
                } else {
                    previous(info);
                }
            }));
        });
        Self {
            was_quiet: QUIET_PANICS.with(|quiet| quiet.replace(true)),
        }
    }

    #[cfg(test)]
    fn active() -> bool {
        QUIET_PANICS.with(Cell::get)
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        QUIET_PANICS.with(|quiet| quiet.set(self.was_quiet));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::Action;
    use crate::core::graph::GraphBuilder;
    use crate::core::registry::StateNode;
    use crate::core::types::StepKind;
    use anyhow::anyhow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn state(transition: Action, checks: Action) -> StateNode {
        StateNode {
            name: "s".to_string(),
            parent: None,
            transition,
            checks,
        }
    }

    #[test]
    fn transition_error_is_a_transition_failure() {
        let body = CaseBody::reachability(&state(
            Action::new("go", || Err(anyhow!("button missing"))),
            Action::noop("check"),
        ));
        let failure = run_case(&body).expect_err("should fail");
        assert_eq!(failure.kind, StepKind::Transition);
        assert_eq!(failure.step, "go");
        assert_eq!(failure.message, "button missing");
    }

    #[test]
    fn check_panic_is_a_check_failure() {
        let body = CaseBody::reachability(&state(
            Action::noop("go"),
            Action::new("check", || panic!("title mismatch")),
        ));
        let failure = run_case(&body).expect_err("should fail");
        assert_eq!(failure.kind, StepKind::Check);
        assert_eq!(failure.message, "panicked: title mismatch");
    }

    #[test]
    fn panics_are_quiet_only_while_the_suite_runs() {
        let seen_quiet = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&seen_quiet);
        let mut builder = GraphBuilder::new();
        builder.transition_test(
            None,
            "home",
            Action::noop("go"),
            Action::new("check", move || {
                flag.store(QuietPanics::active(), Ordering::SeqCst);
                panic!("title mismatch")
            }),
        );
        let graph = builder.build().expect("graph");
        let suite = Suite::describe(&graph).expect("describe");

        assert!(!QuietPanics::active());
        let report =
            execute_suite(&suite, &NoEnvironment, &ExecOptions::default()).expect("execute");
        assert!(!QuietPanics::active());

        assert!(seen_quiet.load(Ordering::SeqCst));
        assert_eq!(report.summary().failed, 1);
    }

    struct BrokenEnvironment;

    impl Environment for BrokenEnvironment {
        fn install(&self) -> Result<()> {
            Err(anyhow!("driver missing"))
        }
    }

    #[test]
    fn environment_failure_is_fatal() {
        let suite = Suite::default();
        let err = execute_suite(&suite, &BrokenEnvironment, &ExecOptions::default())
            .expect_err("install should fail");
        assert!(format!("{err:#}").contains("driver missing"));
    }

    #[test]
    fn filter_skips_unmatched_cases() {
        let mut builder = GraphBuilder::new();
        builder
            .transition_test(None, "home", Action::noop("go"), Action::noop("check"))
            .transition_test(Some("home"), "a", Action::noop("go"), Action::noop("check"))
            .transition_test(Some("home"), "b", Action::noop("go"), Action::noop("check"));
        let graph = builder.build().expect("graph");
        let suite = Suite::describe(&graph).expect("describe");

        let options = ExecOptions {
            filter: Some(Regex::new("^b/").expect("regex")),
        };
        let report = execute_suite(&suite, &NoEnvironment, &options).expect("execute");
        let summary = report.summary();
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.skipped, 2);
    }
}
