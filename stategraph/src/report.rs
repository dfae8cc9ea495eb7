//! Per-case results of one execution pass.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::core::error::CaseFailure;
use crate::core::types::CaseKind;

/// Outcome of a single case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed { failure: CaseFailure },
    /// Excluded by the run filter.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Enclosing scope names, outermost first.
    pub path: Vec<String>,
    pub name: String,
    pub kind: CaseKind,
    pub outcome: CaseOutcome,
    pub duration_ms: u64,
}

impl CaseRecord {
    pub fn full_path(&self) -> String {
        let mut full = self.path.join("/");
        if !full.is_empty() {
            full.push('/');
        }
        full.push_str(&self.name);
        full
    }
}

/// Report persisted after `stategraph run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// RFC 3339 timestamps.
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u64,
    pub cases: Vec<CaseRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for case in &self.cases {
            match case.outcome {
                CaseOutcome::Passed => summary.passed += 1,
                CaseOutcome::Failed { .. } => summary.failed += 1,
                CaseOutcome::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn all_passed(&self) -> bool {
        self.summary().failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&CaseRecord, &CaseFailure)> {
        self.cases.iter().filter_map(|case| match &case.outcome {
            CaseOutcome::Failed { failure } => Some((case, failure)),
            _ => None,
        })
    }

    /// Nested text rendering, one line per scope and case, followed by
    /// numbered failure details.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut open: Vec<String> = Vec::new();
        let mut failure_index = 0usize;

        for case in &self.cases {
            let shared = open
                .iter()
                .zip(&case.path)
                .take_while(|(left, right)| left == right)
                .count();
            open.truncate(shared);
            for scope in &case.path[shared..] {
                let _ = writeln!(out, "{}{}", "  ".repeat(open.len()), scope);
                open.push(scope.clone());
            }

            let indent = "  ".repeat(open.len());
            match &case.outcome {
                CaseOutcome::Passed => {
                    let _ = writeln!(out, "{indent}ok {} ({}ms)", case.name, case.duration_ms);
                }
                CaseOutcome::Failed { .. } => {
                    failure_index += 1;
                    let _ = writeln!(out, "{indent}{failure_index}) {}", case.name);
                }
                CaseOutcome::Skipped => {
                    let _ = writeln!(out, "{indent}- {} (skipped)", case.name);
                }
            }
        }

        for (index, (case, failure)) in self.failures().enumerate() {
            let _ = writeln!(out, "\n{}) {}", index + 1, case.full_path());
            let _ = writeln!(out, "   {failure}");
        }

        let summary = self.summary();
        let _ = writeln!(
            out,
            "\n{} passing, {} failing, {} skipped ({}ms)",
            summary.passed, summary.failed, summary.skipped, self.duration_ms
        );
        out
    }
}
