//! Recording host that freezes the described tree into a [`Suite`].
//!
//! The description phase ends when [`Suite::describe`] returns: the suite is
//! immutable from then on and is the only thing the executor sees.

use std::fmt::Write as _;

use tracing::{debug, instrument};

use crate::core::case::CaseBody;
use crate::core::error::GraphError;
use crate::core::graph::StateGraph;
use crate::core::host::{ScopeBody, TestHost};

/// A registered scope or case.
#[derive(Debug, Clone)]
pub enum SuiteItem {
    Group { name: String, items: Vec<SuiteItem> },
    Case { name: String, body: CaseBody },
}

/// Frozen tree of groups and cases, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    items: Vec<SuiteItem>,
}

/// A case together with the scope names enclosing it.
#[derive(Debug, Clone)]
pub struct CaseRef<'a> {
    pub scopes: Vec<String>,
    pub name: &'a str,
    pub body: &'a CaseBody,
}

impl CaseRef<'_> {
    /// `scope/scope/case` path used for filtering and reporting.
    pub fn path(&self) -> String {
        let mut path = self.scopes.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(self.name);
        path
    }
}

impl Suite {
    /// Run the full description phase for `graph`.
    #[instrument(skip_all)]
    pub fn describe(graph: &StateGraph) -> Result<Suite, GraphError> {
        let mut recorder = SuiteRecorder::default();
        graph.run_all(&mut recorder)?;
        let suite = recorder.finish();
        debug!(cases = suite.case_count(), "suite described");
        Ok(suite)
    }

    pub fn items(&self) -> &[SuiteItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn case_count(&self) -> usize {
        let mut count = 0;
        self.for_each_case(|_| count += 1);
        count
    }

    /// Visit cases depth-first in emission order.
    pub fn for_each_case<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(CaseRef<'a>),
    {
        let mut scopes = Vec::new();
        walk(&self.items, &mut scopes, &mut visit);
    }

    /// Cases with their paths, in emission order.
    pub fn case_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.for_each_case(|case| paths.push(case.path()));
        paths
    }

    /// Indented dry-run rendering listing each case's steps.
    pub fn render_plan(&self) -> String {
        let mut out = String::new();
        render_items(&self.items, 0, &mut out);
        out
    }
}

fn walk<'a, F>(items: &'a [SuiteItem], scopes: &mut Vec<String>, visit: &mut F)
where
    F: FnMut(CaseRef<'a>),
{
    for item in items {
        match item {
            SuiteItem::Group { name, items } => {
                scopes.push(name.clone());
                walk(items, scopes, visit);
                scopes.pop();
            }
            SuiteItem::Case { name, body } => visit(CaseRef {
                scopes: scopes.clone(),
                name,
                body,
            }),
        }
    }
}

fn render_items(items: &[SuiteItem], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for item in items {
        match item {
            SuiteItem::Group { name, items } => {
                let _ = writeln!(out, "{indent}{name}");
                render_items(items, depth + 1, out);
            }
            SuiteItem::Case { name, body } => {
                let _ = writeln!(
                    out,
                    "{indent}- {name} ({}: {})",
                    body.kind(),
                    body.describe_steps()
                );
            }
        }
    }
}

/// [`TestHost`] that records registrations instead of running them.
#[derive(Debug, Default)]
pub struct SuiteRecorder {
    /// Open scopes, innermost last. Index 0 is the top level.
    stack: Vec<Vec<SuiteItem>>,
}

impl SuiteRecorder {
    fn current(&mut self) -> &mut Vec<SuiteItem> {
        if self.stack.is_empty() {
            self.stack.push(Vec::new());
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    pub fn finish(mut self) -> Suite {
        Suite {
            items: std::mem::take(self.current()),
        }
    }
}

impl TestHost for SuiteRecorder {
    fn scope(&mut self, name: &str, body: &mut ScopeBody<'_>) -> Result<(), GraphError> {
        self.current();
        self.stack.push(Vec::new());
        let result = body(self);
        let items = self.stack.pop().unwrap_or_default();
        self.current().push(SuiteItem::Group {
            name: name.to_string(),
            items,
        });
        result
    }

    fn case(&mut self, name: &str, body: CaseBody) {
        self.current().push(SuiteItem::Case {
            name: name.to_string(),
            body,
        });
    }
}
