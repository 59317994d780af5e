//! # Storage Layer
//!
//! On-disk workspace holding the features known to the validator and the
//! configuration snapshots it validates against.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Features | YAML, JSON or TOML | `.update-guard/features/*` |
//! | Configurations | YAML, JSON or TOML | `.update-guard/configurations/{name}.*` |
//! | Config | TOML | `.update-guard/config.toml` |
//!
//! ## Workspace Structure
//!
//! ```text
//! .update-guard/
//! ├── config.toml           # Host and policy settings
//! ├── features/             # One feature per file, or a list
//! └── configurations/
//!     └── current.yaml      # The current configuration
//! ```
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point for accessing a workspace
//! - [`Config`] - Workspace and global configuration

mod config;
pub mod manifest;
mod workspace;

/// Name of the workspace directory
pub const WORKSPACE_DIR: &str = ".update-guard";

pub use config::{
    Config, ConfigError, GlobalConfig, HostConfig, OutputFormat, PolicyConfig, WorkspaceConfig,
};
pub use manifest::{ChangeKind, ChangeSpec, ManifestError};
pub use workspace::{Workspace, WorkspaceError};
