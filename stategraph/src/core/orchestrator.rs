//! Recursive reconstruction of leaf paths into nested scopes and cases.
//!
//! For every leaf (in registration order) the orchestrator opens the leaf's
//! scope, nests each ancestor's scope inside it, and registers one
//! reachability case per state on the path. Ancestors are not memoized: each
//! leaf path replays its own transitions from the root, so a state with `k`
//! leaf descendants gets `k` reachability cases.
//!
//! Preserving tests are the exception. They are emitted only on a state's
//! first visit, so they run exactly once per run no matter how many leaf paths
//! pass through their owner.

use tracing::{debug, instrument, trace};

use crate::core::case::CaseBody;
use crate::core::error::GraphError;
use crate::core::graph::StateGraph;
use crate::core::host::TestHost;
use crate::core::types::REACHED_CASE;

/// Single-use driver for one description pass over a [`StateGraph`].
///
/// Owns the per-run `visited` flags; the graph itself is never mutated.
pub struct Orchestrator<'g> {
    graph: &'g StateGraph,
    visited: Vec<bool>,
}

impl<'g> Orchestrator<'g> {
    pub fn new(graph: &'g StateGraph) -> Self {
        Self {
            graph,
            visited: vec![false; graph.states().len()],
        }
    }

    /// Describe every leaf path, in registration order.
    #[instrument(skip_all, fields(states = self.graph.states().len()))]
    pub fn run_all(&mut self, host: &mut dyn TestHost) -> Result<(), GraphError> {
        let graph = self.graph;
        for position in 0..graph.states().len() {
            if !graph.is_leaf_at(position) {
                continue;
            }
            debug!(leaf = %graph.states().at(position).name, "describing leaf path");
            self.reach_position(host, position, &mut Vec::new())?;
        }
        Ok(())
    }

    /// Emit the scope for `name`, with its ancestry nested inside it ahead of
    /// its own cases.
    pub fn reach_and_test(
        &mut self,
        host: &mut dyn TestHost,
        name: &str,
    ) -> Result<(), GraphError> {
        let position = self
            .graph
            .states()
            .position(name)
            .ok_or_else(|| GraphError::UnknownState {
                name: name.to_string(),
            })?;
        self.reach_position(host, position, &mut Vec::new())
    }

    /// `chain` holds the positions currently being described, leaf first.
    fn reach_position(
        &mut self,
        host: &mut dyn TestHost,
        position: usize,
        chain: &mut Vec<usize>,
    ) -> Result<(), GraphError> {
        let graph = self.graph;
        let state = graph.states().at(position);
        if chain.contains(&position) {
            let mut path: Vec<String> = chain
                .iter()
                .map(|index| graph.states().at(*index).name.clone())
                .collect();
            path.push(state.name.clone());
            return Err(GraphError::Cycle { path });
        }
        chain.push(position);

        host.scope(&state.name, &mut |host| {
            if let Some(parent) = state.parent.as_deref() {
                let parent_position =
                    graph
                        .states()
                        .position(parent)
                        .ok_or_else(|| GraphError::UnknownState {
                            name: parent.to_string(),
                        })?;
                self.reach_position(host, parent_position, chain)?;
            }

            host.case(REACHED_CASE, CaseBody::reachability(state));

            if !self.visited[position] {
                for test in graph.tests_for(&state.name) {
                    host.case(&test.name, CaseBody::preserving(state, test));
                }
                self.visited[position] = true;
                trace!(state = %state.name, "preserving tests emitted");
            }
            Ok(())
        })?;

        chain.pop();
        Ok(())
    }

    /// Whether `name`'s preserving tests have been emitted in this pass.
    pub fn visited(&self, name: &str) -> bool {
        self.graph
            .states()
            .position(name)
            .is_some_and(|position| self.visited[position])
    }
}
