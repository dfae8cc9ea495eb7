//! Command-backed actions and environment setup.
//!
//! Lets a manifest express transitions, checks, and preserving actions as
//! external commands. A command succeeds iff it exits 0 within the timeout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::debug;

use crate::core::action::Action;
use crate::execute::Environment;
use crate::io::process::run_command_with_timeout;

const DIAGNOSTIC_TAIL_BYTES: usize = 2_000;

/// Where and how commands run.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub workdir: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Run `argv` once under `context`, failing on non-zero exit or timeout.
pub fn run_checked(argv: &[String], context: &CommandContext) -> Result<()> {
    let output = run_command_with_timeout(
        argv,
        &context.workdir,
        &context.env,
        context.timeout,
        context.output_limit_bytes,
    )?;
    if output.timed_out {
        bail!(
            "`{}` timed out after {}s",
            argv.join(" "),
            context.timeout.as_secs()
        );
    }
    if !output.status.success() {
        let tail = output.diagnostic_tail(DIAGNOSTIC_TAIL_BYTES);
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        if tail.is_empty() {
            bail!("`{}` exited with {code}", argv.join(" "));
        }
        bail!("`{}` exited with {code}: {tail}", argv.join(" "));
    }
    debug!(command = %argv.join(" "), "command succeeded");
    Ok(())
}

/// Wrap `argv` as an [`Action`] labelled `label`.
pub fn command_action(
    label: impl Into<String>,
    argv: Vec<String>,
    context: Arc<CommandContext>,
) -> Action {
    Action::new(label, move || run_checked(&argv, &context))
}

/// Environment collaborator that runs a setup command before any case.
pub struct CommandEnvironment {
    pub setup: Option<Vec<String>>,
    pub context: Arc<CommandContext>,
}

impl Environment for CommandEnvironment {
    fn install(&self) -> Result<()> {
        match &self.setup {
            Some(argv) => run_checked(argv, &self.context),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn context(workdir: PathBuf) -> Arc<CommandContext> {
        Arc::new(CommandContext {
            workdir,
            env: Vec::new(),
            timeout: Duration::from_secs(10),
            output_limit_bytes: 10_000,
        })
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn action_runs_in_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let action = command_action("touch", sh("touch marker"), context(temp.path().into()));

        action.run().expect("run");
        assert!(temp.path().join("marker").exists());
        assert_eq!(action.label(), "touch");
    }

    #[test]
    fn non_zero_exit_reports_code_and_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let action = command_action(
            "fail",
            sh("echo 'no login form' >&2; exit 4"),
            context(temp.path().into()),
        );

        let err = action.run().expect_err("should fail");
        let message = err.to_string();
        assert!(message.contains("exited with 4"), "{message}");
        assert!(message.contains("no login form"), "{message}");
    }

    #[test]
    fn environment_runs_setup_command() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = CommandEnvironment {
            setup: Some(sh("mkdir app")),
            context: context(temp.path().into()),
        };
        env.install().expect("install");
        assert!(fs::metadata(temp.path().join("app")).expect("app").is_dir());
    }
}
