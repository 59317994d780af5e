//! Feature registry
//!
//! The registry resolves feature references to loaded features. The
//! validator only ever reads from it.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::feature::Feature;
use super::version::VersionedIdentifier;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Feature not found: {0}")]
    NotFound(VersionedIdentifier),

    #[error("Failed to read feature {id}: {reason}")]
    Unreadable {
        id: VersionedIdentifier,
        reason: String,
    },
}

impl RegistryError {
    pub fn identifier(&self) -> &VersionedIdentifier {
        match self {
            RegistryError::NotFound(id) => id,
            RegistryError::Unreadable { id, .. } => id,
        }
    }
}

/// Resolves versioned identifiers to features
pub trait FeatureRegistry {
    fn resolve(&self, id: &VersionedIdentifier) -> Result<Arc<Feature>, RegistryError>;
}

/// A registry backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    features: BTreeMap<VersionedIdentifier, Arc<Feature>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a collection of features
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut registry = Self::new();
        for feature in features {
            registry.insert(feature);
        }
        registry
    }

    /// Adds a feature, replacing any previous one with the same identifier
    pub fn insert(&mut self, feature: Feature) -> Arc<Feature> {
        let feature = Arc::new(feature);
        self.features.insert(feature.id.clone(), Arc::clone(&feature));
        feature
    }

    pub fn contains(&self, id: &VersionedIdentifier) -> bool {
        self.features.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Feature>> {
        self.features.values()
    }
}

impl FeatureRegistry for InMemoryRegistry {
    fn resolve(&self, id: &VersionedIdentifier) -> Result<Arc<Feature>, RegistryError> {
        self.features
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }
}
