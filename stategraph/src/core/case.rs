//! Case bodies emitted during the description phase.
//!
//! A body is data, not a closure: the ordered steps it will run. Nothing runs
//! until the executor walks the frozen suite.

use crate::core::action::Action;
use crate::core::preserving::PreservingTest;
use crate::core::registry::StateNode;
use crate::core::types::{CaseKind, StepKind};

/// One action bound to its role within a case.
#[derive(Debug, Clone)]
pub struct Step {
    pub kind: StepKind,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct CaseBody {
    kind: CaseKind,
    steps: Vec<Step>,
}

impl CaseBody {
    /// Transition into `state`, then verify its checks.
    pub fn reachability(state: &StateNode) -> Self {
        Self {
            kind: CaseKind::Reachability,
            steps: vec![
                Step {
                    kind: StepKind::Transition,
                    action: state.transition.clone(),
                },
                Step {
                    kind: StepKind::Check,
                    action: state.checks.clone(),
                },
            ],
        }
    }

    /// Run `test`'s action, then verify `owner` still holds.
    pub fn preserving(owner: &StateNode, test: &PreservingTest) -> Self {
        Self {
            kind: CaseKind::Preserving,
            steps: vec![
                Step {
                    kind: StepKind::Action,
                    action: test.action.clone(),
                },
                Step {
                    kind: StepKind::Check,
                    action: owner.checks.clone(),
                },
            ],
        }
    }

    pub fn kind(&self) -> CaseKind {
        self.kind
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step labels joined in run order, e.g. `open-home -> check-home`.
    pub fn describe_steps(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.action.label())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
