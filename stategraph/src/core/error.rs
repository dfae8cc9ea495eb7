//! Typed errors for the description and execution phases.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::StepKind;

/// Fatal errors raised while turning the declared graph into cases.
///
/// Any of these stops the description phase: no partial suite is handed to
/// the executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A lookup named a state that was never declared.
    #[error("unknown state '{name}'")]
    UnknownState { name: String },

    /// A declared state names a parent that was never declared.
    #[error("unknown state '{parent}' (declared as parent of '{child}')")]
    UnknownParent { parent: String, child: String },

    /// A leaf's ancestry loops back onto itself.
    #[error("state cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// A failed case, attributed to the step that failed.
///
/// `kind` separates check failures (the application is not in the expected
/// state) from transition and action failures (the step itself broke).
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} '{step}' failed: {message}")]
pub struct CaseFailure {
    pub kind: StepKind,
    /// Label of the action that failed.
    pub step: String,
    pub message: String,
}

impl CaseFailure {
    pub fn is_check_failure(&self) -> bool {
        self.kind == StepKind::Check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_lists_path() {
        let err = GraphError::Cycle {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "state cycle: a -> b -> a");
    }

    #[test]
    fn case_failure_names_kind_and_step() {
        let failure = CaseFailure {
            kind: StepKind::Check,
            step: "check-home".to_string(),
            message: "title missing".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "check 'check-home' failed: title missing"
        );
        assert!(failure.is_check_failure());
    }
}
