//! Manifest file parsing and validation.
//!
//! A manifest is a TOML file declaring states and preserving tests whose
//! actions are external commands. Entry order is registration order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::core::graph::GraphBuilder;
use crate::io::command::{CommandContext, CommandEnvironment, command_action};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub environment: EnvironmentSpec,
    #[serde(default, rename = "state")]
    pub states: Vec<StateSpec>,
    #[serde(default)]
    pub preserving: Vec<PreservingSpec>,
}

/// Setup shared by every command in the manifest.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSpec {
    /// Command run once before any case (e.g. start a mock backend).
    pub setup: Option<Vec<String>>,
    /// Extra environment variables for every command.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StateSpec {
    pub name: String,
    /// Omitted for root states.
    pub parent: Option<String>,
    pub transition: Vec<String>,
    pub checks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PreservingSpec {
    pub state: String,
    pub name: String,
    pub action: Vec<String>,
}

impl Manifest {
    /// Load and validate a manifest from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        Self::parse_str(&contents).with_context(|| format!("load manifest {}", path.display()))
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents).context("parse manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if let Some(setup) = &self.environment.setup {
            validate_argv(setup).context("environment.setup invalid")?;
        }
        for key in self.environment.vars.keys() {
            if key.trim().is_empty() {
                bail!("environment.vars key must be non-empty");
            }
        }
        for (index, state) in self.states.iter().enumerate() {
            state
                .validate()
                .with_context(|| format!("state[{index}] invalid"))?;
        }
        for (index, test) in self.preserving.iter().enumerate() {
            test.validate()
                .with_context(|| format!("preserving[{index}] invalid"))?;
        }
        Ok(())
    }

    /// Declare every entry on a fresh builder, binding commands to `context`.
    pub fn into_builder(self, context: CommandContext) -> (GraphBuilder, CommandEnvironment) {
        let mut context = context;
        context.env.extend(self.environment.vars);
        let context = Arc::new(context);

        let mut builder = GraphBuilder::new();
        for state in self.states {
            let transition = command_action(
                label(&state.transition),
                state.transition,
                Arc::clone(&context),
            );
            let checks = command_action(label(&state.checks), state.checks, Arc::clone(&context));
            builder.transition_test(state.parent.as_deref(), &state.name, transition, checks);
        }
        for test in self.preserving {
            let action = command_action(label(&test.action), test.action, Arc::clone(&context));
            builder.state_preserving_test(&test.state, &test.name, action);
        }

        let environment = CommandEnvironment {
            setup: self.environment.setup,
            context,
        };
        (builder, environment)
    }
}

impl StateSpec {
    fn validate(&self) -> Result<()> {
        validate_name(&self.name).context("name")?;
        if let Some(parent) = &self.parent {
            validate_name(parent).context("parent")?;
        }
        validate_argv(&self.transition).context("transition")?;
        validate_argv(&self.checks).context("checks")?;
        Ok(())
    }
}

impl PreservingSpec {
    fn validate(&self) -> Result<()> {
        validate_name(&self.state).context("state")?;
        validate_name(&self.name).context("name")?;
        validate_argv(&self.action).context("action")?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("must be non-empty");
    }
    if name.contains('/') {
        bail!("must not contain '/'");
    }
    Ok(())
}

fn validate_argv(argv: &[String]) -> Result<()> {
    if argv.is_empty() || argv[0].trim().is_empty() {
        bail!("command must be a non-empty array");
    }
    Ok(())
}

fn label(argv: &[String]) -> String {
    argv.join(" ")
}
