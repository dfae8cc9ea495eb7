//! Test-only helpers for building graphs and observing action order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};

use crate::core::action::Action;

/// Shared, ordered record of which actions ran.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action that appends `label` to the log and succeeds.
    pub fn action(&self, label: &str) -> Action {
        let calls = Arc::clone(&self.calls);
        let entry = label.to_string();
        Action::new(label, move || {
            calls
                .lock()
                .map_err(|_| anyhow!("call log poisoned"))?
                .push(entry.clone());
            Ok(())
        })
    }

    /// Action that appends `label` to the log, then fails with `message`.
    pub fn failing(&self, label: &str, message: &str) -> Action {
        let calls = Arc::clone(&self.calls);
        let entry = label.to_string();
        let message = message.to_string();
        Action::new(label, move || {
            calls
                .lock()
                .map_err(|_| anyhow!("call log poisoned"))?
                .push(entry.clone());
            Err(anyhow!("{message}"))
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// How many times `label` ran.
    pub fn count(&self, label: &str) -> usize {
        self.calls().iter().filter(|call| *call == label).count()
    }
}

/// Write `contents` as `states.toml` under `dir` and return its path.
pub fn write_manifest(dir: &Path, contents: &str) -> Result<PathBuf> {
    let path = dir.join("states.toml");
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Fresh temporary directory for manifest-driven tests.
#[cfg(feature = "test-support")]
pub fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::tempdir().context("create scratch dir")
}
