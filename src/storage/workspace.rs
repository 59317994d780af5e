//! Workspace management
//!
//! Handles workspace initialization and loads the features and
//! configurations it holds.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use super::manifest::{self, ManifestFormat};
use super::{Config, HostConfig, WORKSPACE_DIR};
use crate::domain::{InMemoryRegistry, InstallConfiguration};
use crate::validator::{Host, ValidationPolicy};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not in an update-guard workspace. Run 'update-guard init' first.")]
    NotInWorkspace,

    #[error("Configuration not found: {0}")]
    ConfigurationNotFound(String),
}

const DEFAULT_CONFIG: &str = r#"# update-guard configuration

[host]
# Platform values default to the running system
# os = "linux"
# ws = "gtk"
# arch = "x86_64"
bootstrap_plugins = ["org.eclipse.core.boot", "org.eclipse.core.runtime"]
primary_feature = "org.eclipse.platform"

[policy]
# Require a license agreement on every installed feature
require_license = false

# Configuration in configurations/ holding the current state
current_configuration = "current"
"#;

const DEFAULT_CURRENT: &str = r#"label: current
sites: []
"#;

/// An update-guard workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_workspace_root().ok_or(WorkspaceError::NotInWorkspace)?;

        Self::open(root)
    }

    /// Initializes a new workspace at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dir = root.join(WORKSPACE_DIR);

        for sub in [dir.join("features"), dir.join("configurations")] {
            fs::create_dir_all(&sub)
                .with_context(|| format!("Failed to create directory: {}", sub.display()))?;
        }

        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let current_path = dir.join("configurations").join("current.yaml");
        if !current_path.exists() {
            fs::write(&current_path, DEFAULT_CURRENT).with_context(|| {
                format!("Failed to write configuration: {}", current_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .update-guard directory path
    pub fn dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn features_dir(&self) -> PathBuf {
        self.dir().join("features")
    }

    pub fn configurations_dir(&self) -> PathBuf {
        self.dir().join("configurations")
    }

    /// Host from the workspace config with `overrides` applied
    pub fn host(&self, overrides: &HostConfig) -> Result<Host> {
        self.config.workspace.host.resolve(overrides)
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.config.workspace.policy.validation_policy()
    }

    /// Loads every feature manifest under `features/`.
    ///
    /// Files are read in name order; a later definition of the same
    /// identifier replaces an earlier one.
    pub fn registry(&self) -> Result<InMemoryRegistry> {
        let dir = self.features_dir();
        let mut registry = InMemoryRegistry::new();

        for path in manifest_files(&dir)? {
            for feature in manifest::load_features(&path)? {
                if registry.contains(&feature.id) {
                    warn!(feature = %feature.id, file = %path.display(), "feature defined more than once");
                }
                registry.insert(feature);
            }
        }

        debug!(features = registry.len(), "loaded feature registry");
        Ok(registry)
    }

    /// Loads a configuration snapshot by name
    pub fn configuration(&self, name: &str) -> Result<InstallConfiguration> {
        let dir = self.configurations_dir();
        let path = ["yaml", "yml", "json", "toml"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| WorkspaceError::ConfigurationNotFound(name.to_string()))?;

        manifest::load_configuration(&path)
    }

    /// The configuration holding the current state
    pub fn current_configuration(&self) -> Result<InstallConfiguration> {
        self.configuration(&self.config.workspace.policy.current_configuration)
    }
}

/// Manifest files of a directory, sorted by name
fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if ManifestFormat::from_path(&path).is_some() {
            files.push(path);
        } else {
            debug!(file = %path.display(), "ignoring non-manifest file");
        }
    }
    files.sort();
    Ok(files)
}
