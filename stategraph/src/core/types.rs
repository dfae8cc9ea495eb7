//! Shared deterministic types for the orchestration core.
//!
//! These types define stable contracts between the description phase, the
//! executor, and the persisted report. They must serialize identically across
//! runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the reachability case emitted inside every state scope.
pub const REACHED_CASE: &str = "can be reached";

/// Which kind of generated case a [`crate::core::case::CaseBody`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    /// Runs the state's transition, then its checks.
    Reachability,
    /// Runs a non-destructive action, then the owning state's checks.
    Preserving,
}

/// Role of one action inside a case.
///
/// Failures are attributed to the step kind that produced them, which is how
/// check failures stay distinguishable from transition or action failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Transition,
    Check,
    Action,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::Transition => "transition",
            StepKind::Check => "check",
            StepKind::Action => "action",
        };
        f.write_str(label)
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CaseKind::Reachability => "reachability",
            CaseKind::Preserving => "preserving",
        };
        f.write_str(label)
    }
}
