//! Stable exit codes for stategraph CLI commands.

/// Command succeeded; for `run`, every selected case passed.
pub const OK: i32 = 0;
/// Invalid manifest, config, graph, or arguments, or the environment failed to install.
pub const INVALID: i32 = 1;
/// `stategraph run` finished with at least one failing case.
pub const FAILED: i32 = 2;
