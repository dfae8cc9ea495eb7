//! Orchestration for `stategraph run`: describe, execute, persist.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::execute::{ExecOptions, execute_suite};
use crate::io::report_store::write_report;
use crate::report::RunReport;
use crate::suite::Suite;
use crate::validate::{graph_warnings, load_graph};

/// Caller overrides for a run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub config_path: Option<PathBuf>,
    /// Regex matched against `scope/.../case` paths.
    pub filter: Option<String>,
    /// Report location; overrides the config's `report_path`.
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub report_path: PathBuf,
    pub warnings: Vec<String>,
}

/// Describe the manifest's graph, execute it, and write the report.
///
/// Errors cover invalid input only (config, manifest, graph, filter, or a
/// failed environment install). Failing cases are in `report`.
#[instrument(skip_all, fields(manifest = %manifest_path.display()))]
pub fn run_manifest(manifest_path: &Path, request: &RunRequest) -> Result<RunOutcome> {
    let filter = request
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("compile --filter regex")?;

    let loaded = load_graph(manifest_path, request.config_path.as_deref())?;
    let warnings = graph_warnings(&loaded.graph);
    for warning in &warnings {
        warn!("{warning}");
    }

    let suite = Suite::describe(&loaded.graph).context("describe suite")?;
    info!(cases = suite.case_count(), "executing suite");
    let report = execute_suite(&suite, &loaded.environment, &ExecOptions { filter })?;

    let report_path = match &request.report_path {
        Some(path) => path.clone(),
        None => loaded.base_dir.join(&loaded.config.report_path),
    };
    write_report(&report_path, &report)?;

    Ok(RunOutcome {
        report,
        report_path,
        warnings,
    })
}
