//! Ordered store of declared application states.

use std::collections::HashMap;

use crate::core::action::Action;
use crate::core::error::GraphError;

/// A named point in the application's behavioral state space.
#[derive(Debug, Clone)]
pub struct StateNode {
    pub name: String,
    /// `None` marks a root state.
    pub parent: Option<String>,
    /// Moves the application from the parent's state into this one.
    pub transition: Action,
    /// Verifies the application is currently in this state.
    pub checks: Action,
}

impl StateNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// States keyed by name, iterated in registration order.
///
/// Registration order decides which leaf is processed first, and therefore
/// which leaf path a state's preserving tests end up under.
#[derive(Debug, Default, Clone)]
pub struct StateRegistry {
    nodes: Vec<StateNode>,
    positions: HashMap<String, usize>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node`, or replace the node already registered under its name.
    ///
    /// A replacement keeps the original registration position. Returns the
    /// replaced node, if any.
    pub fn register(&mut self, node: StateNode) -> Option<StateNode> {
        match self.positions.get(&node.name) {
            Some(&position) => Some(std::mem::replace(&mut self.nodes[position], node)),
            None => {
                self.positions.insert(node.name.clone(), self.nodes.len());
                self.nodes.push(node);
                None
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&StateNode, GraphError> {
        self.position(name)
            .map(|position| &self.nodes[position])
            .ok_or_else(|| GraphError::UnknownState {
                name: name.to_string(),
            })
    }

    /// Registration position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Node at a registration position. Panics if out of range.
    pub(crate) fn at(&self, position: usize) -> &StateNode {
        &self.nodes[position]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// True iff no registered state names `name` as its parent.
    pub fn is_leaf(&self, name: &str) -> bool {
        !self
            .nodes
            .iter()
            .any(|node| node.parent.as_deref() == Some(name))
    }

    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str, parent: Option<&str>) -> StateNode {
        StateNode {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            transition: Action::noop(format!("go-{name}")),
            checks: Action::noop(format!("check-{name}")),
        }
    }

    #[test]
    fn all_names_follow_registration_order() {
        let mut registry = StateRegistry::new();
        registry.register(state("b", None));
        registry.register(state("a", Some("b")));
        registry.register(state("c", Some("b")));

        let names: Vec<&str> = registry.all_names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn leaf_iff_nobody_names_it_as_parent() {
        let mut registry = StateRegistry::new();
        registry.register(state("home", None));
        registry.register(state("login", Some("home")));
        registry.register(state("upload", Some("login")));

        assert!(!registry.is_leaf("home"));
        assert!(!registry.is_leaf("login"));
        assert!(registry.is_leaf("upload"));
    }

    #[test]
    fn reregistration_replaces_in_place() {
        let mut registry = StateRegistry::new();
        registry.register(state("a", None));
        registry.register(state("b", None));
        let replaced = registry.register(state("a", Some("b")));

        assert_eq!(replaced.map(|node| node.parent), Some(None));
        let names: Vec<&str> = registry.all_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            registry.lookup("a").expect("a").parent.as_deref(),
            Some("b")
        );
        assert!(!registry.is_leaf("b"));
    }

    #[test]
    fn lookup_unknown_state_fails() {
        let registry = StateRegistry::new();
        let err = registry.lookup("nowhere").expect_err("missing");
        assert_eq!(
            err,
            GraphError::UnknownState {
                name: "nowhere".to_string()
            }
        );
    }
}
