//! Declaration API and the frozen state graph it produces.
//!
//! Test authors declare states and preserving tests on a [`GraphBuilder`].
//! [`GraphBuilder::build`] closes the declaration phase: it resolves parent
//! references, derives leaf status once, and returns an immutable
//! [`StateGraph`] that orchestration runs read from.

use tracing::{debug, warn};

use crate::core::action::Action;
use crate::core::error::GraphError;
use crate::core::host::TestHost;
use crate::core::orchestrator::Orchestrator;
use crate::core::preserving::{PreservingTest, PreservingTestRegistry};
use crate::core::registry::{StateNode, StateRegistry};

/// Mutable collector for state and preserving-test declarations.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    states: StateRegistry,
    preserving: PreservingTestRegistry,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`, reached from `previous` (or a root when `None`).
    ///
    /// Declaring a name twice replaces the earlier declaration.
    pub fn transition_test(
        &mut self,
        previous: Option<&str>,
        name: &str,
        transition: Action,
        checks: Action,
    ) -> &mut Self {
        let replaced = self.states.register(StateNode {
            name: name.to_string(),
            parent: previous.map(str::to_string),
            transition,
            checks,
        });
        if replaced.is_some() {
            warn!(state = name, "state declared twice; keeping the latest declaration");
        }
        self
    }

    /// Attach a non-destructive test to `state`, declared now or later.
    pub fn state_preserving_test(&mut self, state: &str, name: &str, action: Action) -> &mut Self {
        self.preserving.attach(state, name, action);
        self
    }

    /// Freeze the declarations into a [`StateGraph`].
    ///
    /// Fails if any parent reference does not resolve. Cycles are not
    /// rejected here; the orchestrator reports them when a leaf reaches one.
    pub fn build(self) -> Result<StateGraph, GraphError> {
        for node in self.states.iter() {
            if let Some(parent) = node.parent.as_deref()
                && !self.states.contains(parent)
            {
                return Err(GraphError::UnknownParent {
                    parent: parent.to_string(),
                    child: node.name.clone(),
                });
            }
        }

        let leaves = self
            .states
            .all_names()
            .map(|name| self.states.is_leaf(name))
            .collect::<Vec<_>>();
        debug!(
            states = self.states.len(),
            leaves = leaves.iter().filter(|leaf| **leaf).count(),
            preserving = self.preserving.len(),
            "state graph built"
        );

        Ok(StateGraph {
            states: self.states,
            preserving: self.preserving,
            leaves,
        })
    }
}

/// Immutable, validated state graph.
#[derive(Debug, Clone)]
pub struct StateGraph {
    states: StateRegistry,
    preserving: PreservingTestRegistry,
    /// Leaf flag per registration position.
    leaves: Vec<bool>,
}

impl StateGraph {
    pub fn states(&self) -> &StateRegistry {
        &self.states
    }

    pub fn lookup(&self, name: &str) -> Result<&StateNode, GraphError> {
        self.states.lookup(name)
    }

    pub fn is_leaf(&self, name: &str) -> bool {
        self.states
            .position(name)
            .is_some_and(|position| self.leaves[position])
    }

    pub(crate) fn is_leaf_at(&self, position: usize) -> bool {
        self.leaves[position]
    }

    /// Leaf names in registration order.
    pub fn leaves(&self) -> impl Iterator<Item = &str> {
        self.states
            .all_names()
            .zip(self.leaves.iter())
            .filter_map(|(name, leaf)| leaf.then_some(name))
    }

    pub fn tests_for(&self, state: &str) -> &[PreservingTest] {
        self.preserving.tests_for(state)
    }

    /// Preserving tests whose owner was never declared. They never run.
    pub fn orphaned_tests(&self) -> Vec<&PreservingTest> {
        let mut owners: Vec<&str> = self
            .preserving
            .owners()
            .filter(|owner| !self.states.contains(owner))
            .collect();
        owners.sort_unstable();
        owners
            .into_iter()
            .flat_map(|owner| self.preserving.tests_for(owner))
            .collect()
    }

    /// States no leaf can reach by walking parents. Their cases never run.
    pub fn unreached_states(&self) -> Vec<&str> {
        let mut reached = vec![false; self.states.len()];
        for (position, leaf) in self.leaves.iter().enumerate() {
            if !*leaf {
                continue;
            }
            let mut current = Some(position);
            while let Some(index) = current {
                if reached[index] {
                    break;
                }
                reached[index] = true;
                current = self
                    .states
                    .at(index)
                    .parent
                    .as_deref()
                    .and_then(|parent| self.states.position(parent));
            }
        }
        self.states
            .all_names()
            .zip(reached)
            .filter_map(|(name, reached)| (!reached).then_some(name))
            .collect()
    }

    /// Describe every leaf path onto `host` with a fresh orchestrator.
    pub fn run_all(&self, host: &mut dyn TestHost) -> Result<(), GraphError> {
        Orchestrator::new(self).run_all(host)
    }
}
