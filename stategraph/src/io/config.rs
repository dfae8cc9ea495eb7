//! Run configuration loaded from `stategraph.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up next to the manifest.
pub const CONFIG_FILE_NAME: &str = "stategraph.toml";

/// Run configuration (TOML).
///
/// Missing fields default to sensible values; a missing file means all
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock budget for each transition, check, or action command.
    pub command_timeout_secs: u64,

    /// Truncate captured command stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Where `stategraph run` writes its JSON report, relative to the manifest
    /// directory when not absolute.
    pub report_path: PathBuf,

    /// Directory commands run in. Defaults to the manifest directory.
    pub workdir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 60,
            output_limit_bytes: 100_000,
            report_path: PathBuf::from("stategraph-report.json"),
            workdir: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.report_path.as_os_str().is_empty() {
            return Err(anyhow!("report_path must be non-empty"));
        }
        if let Some(workdir) = &self.workdir
            && workdir.as_os_str().is_empty()
        {
            return Err(anyhow!("workdir must be non-empty when set"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    if !path.exists() {
        let cfg = RunConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "command_timeout_secs = 5\nworkdir = \"app\"\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.command_timeout_secs, 5);
        assert_eq!(cfg.workdir, Some(PathBuf::from("app")));
        assert_eq!(cfg.output_limit_bytes, RunConfig::default().output_limit_bytes);
    }

    #[test]
    fn rejects_zero_timeout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "command_timeout_secs = 0\n").expect("write");

        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("command_timeout_secs"));
    }
}
