//! Capability the orchestrator needs from a test runner.

use crate::core::case::CaseBody;
use crate::core::error::GraphError;

/// Body of a grouping scope; receives the host to register nested items on.
pub type ScopeBody<'a> = dyn FnMut(&mut dyn TestHost) -> Result<(), GraphError> + 'a;

/// Grouping and case registration primitives.
///
/// Registration is synchronous and nested: `scope` must call `body` before
/// returning so nested scopes and cases land inside it. Case bodies are stored,
/// never run, at registration time; isolating a failing case from its siblings
/// is the host's job once execution starts.
pub trait TestHost {
    fn scope(&mut self, name: &str, body: &mut ScopeBody<'_>) -> Result<(), GraphError>;

    fn case(&mut self, name: &str, body: CaseBody);
}
