//! Declarative state-graph test orchestration.
//!
//! Acceptance tests are declared as a graph of named application states. Each
//! state has a transition from its parent and a check confirming it holds;
//! non-destructive "preserving" tests attach to a state and are verified by
//! that state's check. Running the graph replays every leaf's path from its
//! root, sharing the expensive state reconstruction across tests, while
//! preserving tests run exactly once however many paths cross their state.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (registries, graph building, the
//!   orchestrator that describes nested scopes and cases). No I/O.
//! - **[`io`]**: Side-effecting operations (manifests, config, child
//!   processes, report files).
//!
//! [`suite`] freezes a description into an immutable tree, [`execute`] runs
//! it with per-case failure isolation, and [`validate`] and [`run`] join core
//! logic with I/O to implement CLI commands.
//!
//! ```
//! use stategraph::core::action::Action;
//! use stategraph::core::graph::GraphBuilder;
//! use stategraph::execute::{ExecOptions, NoEnvironment, execute_suite};
//! use stategraph::suite::Suite;
//!
//! let mut builder = GraphBuilder::new();
//! builder
//!     .transition_test(None, "home", Action::noop("open-home"), Action::noop("check-home"))
//!     .transition_test(Some("home"), "login", Action::noop("go-login"), Action::noop("check-login"))
//!     .state_preserving_test("home", "refresh-keeps-home", Action::noop("refresh"));
//! let graph = builder.build()?;
//!
//! let suite = Suite::describe(&graph)?;
//! let report = execute_suite(&suite, &NoEnvironment, &ExecOptions::default())?;
//! assert!(report.all_passed());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod core;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod report;
pub mod run;
pub mod suite;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
