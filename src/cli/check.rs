//! Validation commands (status, install, revert, delta, batch, ...)

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::output::Output;
use crate::domain::{InMemoryRegistry, InstallConfiguration};
use crate::storage::manifest;
use crate::storage::{ChangeSpec, HostConfig, Workspace};
use crate::validator::{Host, ValidationPolicy, Validator};

/// Everything a validation reads, loaded from the workspace
struct Session {
    workspace: Workspace,
    registry: InMemoryRegistry,
    current: InstallConfiguration,
    host: Host,
    policy: ValidationPolicy,
}

impl Session {
    fn open(overrides: &HostConfig) -> Result<Self> {
        let workspace = Workspace::open_current()?;
        let registry = workspace.registry()?;
        let current = workspace
            .current_configuration()
            .context("Failed to load the current configuration")?;
        let host = workspace.host(overrides)?;
        let policy = workspace.policy();

        debug!(
            root = %workspace.root().display(),
            os = %host.os,
            ws = %host.ws,
            arch = %host.arch,
            "opened workspace"
        );

        Ok(Self {
            workspace,
            registry,
            current,
            host,
            policy,
        })
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.registry, &self.current, &self.host).with_policy(self.policy)
    }
}

/// Validates the current configuration
pub fn status(output: &Output, overrides: &HostConfig) -> Result<bool> {
    let session = Session::open(overrides)?;
    let diagnostic = session.validator().validate_current_state();
    Ok(output.outcome(diagnostic.as_ref()))
}

/// Validates a single change
pub fn change(output: &Output, overrides: &HostConfig, spec: &ChangeSpec) -> Result<bool> {
    let session = Session::open(overrides)?;
    let change = spec
        .resolve(&session.registry)
        .context("Failed to resolve the change")?;

    let diagnostic = session.validator().validate_change(&change);
    Ok(output.outcome(diagnostic.as_ref()))
}

/// Validates reverting to a saved configuration
pub fn revert(output: &Output, overrides: &HostConfig, name: &str) -> Result<bool> {
    let session = Session::open(overrides)?;
    let target = session.workspace.configuration(name)?;

    let diagnostic = session.validator().validate_revert(&target);
    Ok(output.outcome(diagnostic.as_ref()))
}

/// Validates a session delta manifest
pub fn delta(output: &Output, overrides: &HostConfig, file: &Path) -> Result<bool> {
    let session = Session::open(overrides)?;
    let delta = manifest::load_delta(file)?;

    let diagnostic = session.validator().validate_delta(&delta);
    Ok(output.outcome(diagnostic.as_ref()))
}

/// Validates a batch manifest
pub fn batch(output: &Output, overrides: &HostConfig, file: &Path) -> Result<bool> {
    let session = Session::open(overrides)?;
    let changes = manifest::load_batch(file)?
        .iter()
        .map(|spec| spec.resolve(&session.registry))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to resolve batch: {}", file.display()))?;

    let diagnostic = session.validator().validate_batch(&changes);
    Ok(output.outcome(diagnostic.as_ref()))
}
