//! Deterministic, pure logic for the state-graph engine.
//!
//! Core modules must be free of I/O side effects. They declare, validate, and
//! describe the state graph; running the described cases happens elsewhere.

pub mod action;
pub mod case;
pub mod error;
pub mod graph;
pub mod host;
pub mod orchestrator;
pub mod preserving;
pub mod registry;
pub mod types;
