//! Non-destructive tests attached to states by name.

use std::collections::HashMap;

use crate::core::action::Action;

/// A test assumed to leave its owning state unchanged.
#[derive(Debug, Clone)]
pub struct PreservingTest {
    pub owner: String,
    pub name: String,
    pub action: Action,
}

/// Ordered preserving tests per owner name.
///
/// Owners are resolved lazily: attaching to a name that is declared later, or
/// never, is allowed.
#[derive(Debug, Default, Clone)]
pub struct PreservingTestRegistry {
    tests: HashMap<String, Vec<PreservingTest>>,
}

impl PreservingTestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, owner: &str, name: &str, action: Action) {
        self.tests
            .entry(owner.to_string())
            .or_default()
            .push(PreservingTest {
                owner: owner.to_string(),
                name: name.to_string(),
                action,
            });
    }

    /// Tests for `owner` in attach order; empty if none were attached.
    pub fn tests_for(&self, owner: &str) -> &[PreservingTest] {
        self.tests.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tests.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tests_keep_attach_order_per_owner() {
        let mut registry = PreservingTestRegistry::new();
        registry.attach("home", "first", Action::noop("a"));
        registry.attach("login", "other", Action::noop("b"));
        registry.attach("home", "second", Action::noop("c"));

        let names: Vec<&str> = registry
            .tests_for("home")
            .iter()
            .map(|test| test.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_owner_has_no_tests() {
        let registry = PreservingTestRegistry::new();
        assert!(registry.tests_for("ghost").is_empty());
        assert!(registry.is_empty());
    }
}
