//! Feature, configuration, delta and batch manifests
//!
//! Manifests are YAML, JSON or TOML; the format is picked by file extension.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Feature, FeatureRegistry, InstallConfiguration, PendingChange, RegistryError, SessionDelta,
    VersionedIdentifier,
};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Unsupported manifest format: {0} (expected .yaml, .yml, .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Manifest encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
    Toml,
}

impl ManifestFormat {
    /// Picks the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(ManifestFormat::Yaml),
            "json" => Some(ManifestFormat::Json),
            "toml" => Some(ManifestFormat::Toml),
            _ => None,
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T, String> {
        match self {
            ManifestFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ManifestFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ManifestFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Reads and parses a manifest of any supported format
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = ManifestFormat::from_path(path)
        .ok_or_else(|| ManifestError::UnsupportedFormat(path.to_path_buf()))?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    format.parse(&content).map_err(|reason| {
        ManifestError::Parse {
            path: path.to_path_buf(),
            reason,
        }
        .into()
    })
}

/// A feature file holds one feature or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureFile {
    Many { features: Vec<Feature> },
    List(Vec<Feature>),
    One(Box<Feature>),
}

impl FeatureFile {
    fn into_features(self) -> Vec<Feature> {
        match self {
            FeatureFile::Many { features } | FeatureFile::List(features) => features,
            FeatureFile::One(feature) => vec![*feature],
        }
    }
}

/// Loads all features defined in a feature file
pub fn load_features(path: &Path) -> Result<Vec<Feature>> {
    Ok(load::<FeatureFile>(path)?.into_features())
}

pub fn load_configuration(path: &Path) -> Result<InstallConfiguration> {
    load(path)
}

pub fn load_delta(path: &Path) -> Result<SessionDelta> {
    load(path)
}

/// The operation of a batch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Install,
    Uninstall,
    Configure,
    Unconfigure,
}

/// A change as written in a batch manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSpec {
    pub kind: ChangeKind,
    pub feature: VersionedIdentifier,

    /// Feature replaced by an install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<VersionedIdentifier>,
}

impl ChangeSpec {
    /// Resolves the referenced features into a pending change
    pub fn resolve(&self, registry: &dyn FeatureRegistry) -> Result<PendingChange, RegistryError> {
        let feature = registry.resolve(&self.feature)?;
        Ok(match self.kind {
            ChangeKind::Install => match &self.replaces {
                Some(old) => PendingChange::update(feature, registry.resolve(old)?),
                None => PendingChange::install(feature),
            },
            ChangeKind::Uninstall => PendingChange::Uninstall { feature },
            ChangeKind::Configure => PendingChange::Configure { feature },
            ChangeKind::Unconfigure => PendingChange::Unconfigure { feature },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Document { changes: Vec<ChangeSpec> },
    List(Vec<ChangeSpec>),
}

/// Loads a batch of changes, written as a list or under `changes`
pub fn load_batch(path: &Path) -> Result<Vec<ChangeSpec>> {
    Ok(match load::<BatchFile>(path)? {
        BatchFile::Document { changes } | BatchFile::List(changes) => changes,
    })
}
