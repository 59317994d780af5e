//! Configuration handling for update-guard
//!
//! Configuration is stored in `.update-guard/config.toml` (workspace) and
//! `~/.config/update-guard/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WORKSPACE_DIR;
use crate::validator::{Host, ValidationPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Host settings; unset fields fall back to the running platform
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    /// Plugins that must be contributed by some configured feature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_plugins: Option<Vec<String>>,

    /// Feature that must always stay configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_feature: Option<String>,
}

impl HostConfig {
    /// Layers `overrides` over this config and the running platform
    pub fn resolve(&self, overrides: &HostConfig) -> Result<Host> {
        let mut host = Host::current();

        for layer in [self, overrides] {
            if let Some(os) = &layer.os {
                host.os = os.clone();
            }
            if let Some(ws) = &layer.ws {
                host.ws = ws.clone();
            }
            if let Some(arch) = &layer.arch {
                host.arch = arch.clone();
            }
            if let Some(plugins) = &layer.bootstrap_plugins {
                host.bootstrap_plugins = plugins.clone();
            }
            if let Some(primary) = &layer.primary_feature {
                host.primary_feature = primary.clone();
            }
        }

        if host.primary_feature.trim().is_empty() {
            return Err(ConfigError::Invalid("host.primary_feature must not be empty".to_string()).into());
        }

        Ok(host)
    }
}

/// Validation policy settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Installs must carry a license agreement
    pub require_license: bool,

    /// Configuration that holds the current state
    pub current_configuration: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            require_license: false,
            current_configuration: "current".to_string(),
        }
    }
}

impl PolicyConfig {
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            require_license: self.require_license,
        }
    }
}

/// Workspace-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub host: HostConfig,
    pub policy: PolicyConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + workspace)
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub global: GlobalConfig,
    pub workspace_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific workspace
    pub fn for_workspace(workspace_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let workspace = Self::load_workspace_config(workspace_root)?;

        Ok(Self {
            workspace,
            global,
            workspace_root: Some(workspace_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "update-guard", "update-guard")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads workspace configuration from a specific root
    fn load_workspace_config(workspace_root: &Path) -> Result<WorkspaceConfig> {
        let config_path = workspace_root.join(WORKSPACE_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(WorkspaceConfig::default());
        }

        let content = fs::read_to_string(&config_path).with_context(|| {
            format!("Failed to read workspace config: {}", config_path.display())
        })?;

        Self::parse_workspace_config(&content).context("Failed to parse workspace config")
    }

    fn parse_workspace_config(content: &str) -> Result<WorkspaceConfig, ConfigError> {
        let config: WorkspaceConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if config.policy.current_configuration.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "policy.current_configuration must not be empty".to_string(),
            ));
        }

        Ok(config)
    }

    /// Finds the workspace root by looking for `.update-guard/` directory
    pub fn find_workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_workspace_root_from(&current)
    }

    /// Walks up from `start` looking for `.update-guard/`
    pub fn find_workspace_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the workspace root, or an error if not in a workspace
    pub fn require_workspace_root(&self) -> Result<&Path> {
        self.workspace_root.as_deref().ok_or_else(|| {
            anyhow::anyhow!("Not in an update-guard workspace. Run 'update-guard init' first.")
        })
    }
}
