//! Typed zero-input actions supplied by test authors.
//!
//! Transitions, checks, and preserving-test bodies are all [`Action`]s. An
//! action either completes or fails with an `anyhow::Error`; the engine decides
//! which failure kind that is from the step the action was bound to.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

type ActionFn = dyn Fn() -> Result<()> + Send + Sync;

/// Labelled, cheaply clonable callable with no input.
///
/// The same action value is shared by every case that needs it (a state's
/// `checks` runs in each reachability case and each preserving case), so
/// clones share one closure.
#[derive(Clone)]
pub struct Action {
    label: String,
    run: Arc<ActionFn>,
}

impl Action {
    pub fn new<F>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            run: Arc::new(run),
        }
    }

    /// Action that always completes. Useful for roots with nothing to do.
    pub fn noop(label: impl Into<String>) -> Self {
        Self::new(label, || Ok(()))
    }

    /// Human-readable label shown in plans and failure reports.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn run(&self) -> Result<()> {
        (self.run)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
