//! Loading and validation for `stategraph validate` (shared by `plan` and `run`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::graph::StateGraph;
use crate::io::command::{CommandContext, CommandEnvironment};
use crate::io::config::{CONFIG_FILE_NAME, RunConfig, load_config};
use crate::io::manifest::Manifest;
use crate::suite::Suite;

/// A manifest turned into a frozen graph, with everything needed to run it.
pub struct LoadedGraph {
    pub graph: StateGraph,
    pub environment: CommandEnvironment,
    pub config: RunConfig,
    /// Directory relative paths in the config resolve against.
    pub base_dir: PathBuf,
}

/// High-level validation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub states: usize,
    pub leaves: usize,
    pub cases: usize,
    /// Non-fatal findings (orphaned preserving tests, unreached states).
    pub warnings: Vec<String>,
}

/// Load config and manifest, and build the state graph.
///
/// `config_path` defaults to `stategraph.toml` next to the manifest.
#[instrument(skip_all, fields(manifest = %manifest_path.display()))]
pub fn load_graph(manifest_path: &Path, config_path: Option<&Path>) -> Result<LoadedGraph> {
    let base_dir = manifest_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let config_path = config_path.map_or_else(|| base_dir.join(CONFIG_FILE_NAME), Path::to_path_buf);
    let config = load_config(&config_path).with_context(|| "load config")?;

    let manifest = Manifest::load(manifest_path)?;
    let workdir = match &config.workdir {
        Some(workdir) => base_dir.join(workdir),
        None => base_dir.clone(),
    };
    let context = CommandContext {
        workdir,
        env: Vec::new(),
        timeout: Duration::from_secs(config.command_timeout_secs),
        output_limit_bytes: config.output_limit_bytes,
    };
    let (builder, environment) = manifest.into_builder(context);
    let graph = builder.build().with_context(|| "build state graph")?;

    Ok(LoadedGraph {
        graph,
        environment,
        config,
        base_dir,
    })
}

/// Validate a manifest: it must load, build, and describe without errors.
pub fn validate_manifest(manifest_path: &Path, config_path: Option<&Path>) -> Result<ValidateOutcome> {
    let loaded = load_graph(manifest_path, config_path)?;
    let suite = Suite::describe(&loaded.graph).with_context(|| "describe suite")?;
    let outcome = ValidateOutcome {
        states: loaded.graph.states().len(),
        leaves: loaded.graph.leaves().count(),
        cases: suite.case_count(),
        warnings: graph_warnings(&loaded.graph),
    };
    info!(
        states = outcome.states,
        leaves = outcome.leaves,
        cases = outcome.cases,
        warnings = outcome.warnings.len(),
        "manifest valid"
    );
    Ok(outcome)
}

/// Findings that do not stop a run but usually indicate an authoring slip.
pub fn graph_warnings(graph: &StateGraph) -> Vec<String> {
    let mut warnings = Vec::new();
    for test in graph.orphaned_tests() {
        warnings.push(format!(
            "preserving test '{}' is attached to undeclared state '{}' and will never run",
            test.name, test.owner
        ));
    }
    for state in graph.unreached_states() {
        warnings.push(format!(
            "state '{state}' has no leaf descendant; its cases will never run"
        ));
    }
    warnings
}
