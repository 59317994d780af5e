//! Candidate feature sets and the plugins they contribute

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::domain::{Feature, Import, Version, VersionedIdentifier};

/// A set of features keyed by versioned identifier, in insertion order.
///
/// Iteration order is the order features were first added, which fixes the
/// order violations are reported in.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    features: Vec<Arc<Feature>>,
    index: HashSet<VersionedIdentifier>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature; returns false if one with the same identifier is present
    pub fn insert(&mut self, feature: Arc<Feature>) -> bool {
        if self.index.insert(feature.id.clone()) {
            self.features.push(feature);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &VersionedIdentifier) -> bool {
        self.index.contains(id)
    }

    pub fn get(&self, id: &VersionedIdentifier) -> Option<&Arc<Feature>> {
        if !self.index.contains(id) {
            return None;
        }
        self.features.iter().find(|f| &f.id == id)
    }

    /// Returns true if some feature has the given id, in any version
    pub fn contains_id(&self, id: &str) -> bool {
        self.features.iter().any(|f| f.id.id() == id)
    }

    /// Features with the given id, in any version
    pub fn with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<Feature>> {
        self.features.iter().filter(move |f| f.id.id() == id)
    }

    /// Adds every feature of `other` not already present
    pub fn extend(&mut self, other: &CandidateSet) {
        for feature in &other.features {
            self.insert(Arc::clone(feature));
        }
    }

    /// Removes every feature present in `other`
    pub fn subtract(&mut self, other: &CandidateSet) {
        if other.is_empty() {
            return;
        }
        self.features.retain(|f| !other.contains(&f.id));
        self.index.retain(|id| !other.contains(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Feature>> {
        self.features.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &VersionedIdentifier> {
        self.features.iter().map(|f| &f.id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Arc<Feature>> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Arc<Feature>>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for feature in iter {
            set.insert(feature);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Arc<Feature>;
    type IntoIter = std::slice::Iter<'a, Arc<Feature>>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Two sets are equal when they hold the same identifiers, in any order
impl PartialEq for CandidateSet {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

/// Plugins contributed by a candidate set, keyed by id then version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSet {
    plugins: BTreeMap<String, BTreeSet<Version>>,
}

impl PluginSet {
    pub fn from_features(features: &CandidateSet) -> Self {
        let mut set = PluginSet::default();
        for feature in features {
            for plugin in &feature.plugins {
                set.insert(plugin);
            }
        }
        set
    }

    pub fn insert(&mut self, plugin: &VersionedIdentifier) {
        self.plugins
            .entry(plugin.id().to_string())
            .or_default()
            .insert(plugin.version());
    }

    /// Presence by id, regardless of version
    pub fn contains_id(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    pub fn versions<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Version> {
        self.plugins.get(id).into_iter().flatten()
    }

    /// Returns true if some plugin with the import's id satisfies its rule
    pub fn satisfies(&self, import: &Import) -> bool {
        self.versions(import.target.id())
            .any(|version| import.is_satisfied_by(version))
    }

    /// Number of distinct `(id, version)` entries
    pub fn len(&self) -> usize {
        self.plugins.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
