//! I/O helpers for stategraph commands.

pub mod command;
pub mod config;
pub mod manifest;
pub mod process;
pub mod report_store;
