//! Declarative state-graph test runner.
//!
//! Loads a TOML manifest of states and preserving tests backed by external
//! commands, describes every leaf path, and runs the resulting cases.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use stategraph::exit_codes;
use stategraph::logging;
use stategraph::run::{RunRequest, run_manifest};
use stategraph::suite::Suite;
use stategraph::validate::{graph_warnings, load_graph, validate_manifest};

#[derive(Parser)]
#[command(
    name = "stategraph",
    version,
    about = "Declarative state-graph test runner"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the manifest loads and its graph describes without errors.
    Validate {
        manifest: PathBuf,
        /// Config file (default: `stategraph.toml` next to the manifest).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the nested scopes and cases a run would execute.
    Plan {
        manifest: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Execute every case and write the JSON report.
    Run {
        manifest: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only run cases whose `scope/.../case` path matches this regex.
        #[arg(long)]
        filter: Option<String>,
        /// Report path (overrides `report_path` from the config).
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Validate { manifest, config } => cmd_validate(manifest, config),
        Command::Plan { manifest, config } => cmd_plan(manifest, config),
        Command::Run {
            manifest,
            config,
            filter,
            report,
        } => cmd_run(
            manifest,
            RunRequest {
                config_path: config,
                filter,
                report_path: report,
            },
        ),
    }
}

fn cmd_validate(manifest: PathBuf, config: Option<PathBuf>) -> Result<i32> {
    let outcome = validate_manifest(&manifest, config.as_deref())?;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    println!(
        "valid: states={} leaves={} cases={}",
        outcome.states, outcome.leaves, outcome.cases
    );
    Ok(exit_codes::OK)
}

fn cmd_plan(manifest: PathBuf, config: Option<PathBuf>) -> Result<i32> {
    let loaded = load_graph(&manifest, config.as_deref())?;
    for warning in graph_warnings(&loaded.graph) {
        eprintln!("warning: {}", warning);
    }
    let suite = Suite::describe(&loaded.graph)?;
    print!("{}", suite.render_plan());
    Ok(exit_codes::OK)
}

fn cmd_run(manifest: PathBuf, request: RunRequest) -> Result<i32> {
    let outcome = run_manifest(&manifest, &request)?;
    print!("{}", outcome.report.render());
    println!("report: {}", outcome.report_path.display());
    if outcome.report.all_passed() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::FAILED)
    }
}
