//! Candidate set construction
//!
//! Computes the set of features that would be configured after an
//! operation: the closure of a feature over its includes, and the result of
//! adding/removing subtrees, reverting to a snapshot, or applying a session
//! delta.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::candidate::CandidateSet;
use super::error::StructuralError;
use super::violation::FeatureLabel;
use crate::domain::{
    Feature, FeatureRegistry, IncludedFeature, InstallConfiguration, MatchRule, RegistryError,
    SessionDelta, VersionedIdentifier,
};

/// Computes `top` plus every feature reachable through its includes.
///
/// With `tolerate_missing_children`, includes that fail to resolve are
/// skipped; otherwise only optional ones are. A cycle always fails.
pub fn closure(
    top: &Arc<Feature>,
    registry: &dyn FeatureRegistry,
    tolerate_missing_children: bool,
) -> Result<CandidateSet, StructuralError> {
    Closure {
        top,
        registry,
        tolerate_missing_children,
        configured: None,
    }
    .run()
}

struct Closure<'a> {
    top: &'a Arc<Feature>,
    registry: &'a dyn FeatureRegistry,
    tolerate_missing_children: bool,
    /// When set, non-perfect includes of `top` prefer a better configured feature
    configured: Option<&'a CandidateSet>,
}

impl Closure<'_> {
    fn run(&self) -> Result<CandidateSet, StructuralError> {
        let mut path = HashSet::new();
        let mut result = CandidateSet::new();
        self.walk(Arc::clone(self.top), &mut path, &mut result)?;
        debug!(top = %self.top.id, size = result.len(), "computed feature closure");
        Ok(result)
    }

    fn walk(
        &self,
        feature: Arc<Feature>,
        path: &mut HashSet<VersionedIdentifier>,
        result: &mut CandidateSet,
    ) -> Result<(), StructuralError> {
        if path.contains(&feature.id) {
            return Err(StructuralError::Cycle {
                feature: FeatureLabel::of(self.top),
            });
        }
        // Fully walked already through another parent
        if !result.insert(Arc::clone(&feature)) {
            return Ok(());
        }

        path.insert(feature.id.clone());
        let is_top = feature.id == self.top.id;
        for include in &feature.includes {
            let child = match self.resolve(include, is_top) {
                Ok(child) => child,
                Err(source) if include.optional || self.tolerate_missing_children => {
                    warn!(
                        parent = %feature.id,
                        child = %include.identifier(),
                        error = %source,
                        "skipping unresolved included feature"
                    );
                    continue;
                }
                Err(source) => {
                    return Err(StructuralError::MissingChild {
                        feature: FeatureLabel::of(self.top),
                        source,
                    })
                }
            };
            self.walk(child, path, result)?;
        }
        path.remove(&feature.id);

        Ok(())
    }

    fn resolve(&self, include: &IncludedFeature, is_top: bool) -> Result<Arc<Feature>, RegistryError> {
        if let Some(configured) = self.configured.filter(|_| is_top) {
            if let Some(better) = best_configured_match(include, configured) {
                return Ok(better);
            }
        }
        include.feature.resolve(self.registry)
    }
}

/// A configured feature newer than the include's target that still matches it.
///
/// Perfect includes always take the referenced version.
fn best_configured_match(include: &IncludedFeature, configured: &CandidateSet) -> Option<Arc<Feature>> {
    if matches!(include.rule, MatchRule::Perfect | MatchRule::None) {
        return None;
    }
    let target = include.identifier();
    configured
        .with_id(target.id())
        .filter(|f| f.version() > target.version())
        .filter(|f| include.rule.accepts(&f.version(), &target.version()))
        .max_by_key(|f| f.version())
        .cloned()
}

/// Features configured across all sites of a configuration
pub fn configured_features(
    config: &InstallConfiguration,
    registry: &dyn FeatureRegistry,
) -> Result<CandidateSet, StructuralError> {
    let mut features = CandidateSet::new();
    for id in config.configured_features() {
        features.insert(registry.resolve(id)?);
    }
    Ok(features)
}

/// Computes `(base ∪ closure(add)) \ closure(remove)`.
///
/// The add tree must resolve completely; the remove tree tolerates missing
/// children. Patches in `base` of any removed feature are removed too.
pub fn after_operation(
    base: &CandidateSet,
    add: Option<&Arc<Feature>>,
    remove: Option<&Arc<Feature>>,
    registry: &dyn FeatureRegistry,
) -> Result<CandidateSet, StructuralError> {
    let add_tree = match add {
        Some(feature) => Closure {
            top: feature,
            registry,
            tolerate_missing_children: false,
            configured: Some(base),
        }
        .run()?,
        None => CandidateSet::new(),
    };

    let remove_tree = match remove {
        Some(feature) => {
            let mut tree = closure(feature, registry, true)?;
            let patches = patches_for(&tree, base, registry)?;
            tree.extend(&patches);
            tree
        }
        None => CandidateSet::new(),
    };

    let mut result = base.clone();
    result.extend(&add_tree);
    result.subtract(&remove_tree);

    debug!(
        base = base.len(),
        added = add_tree.len(),
        removed = remove_tree.len(),
        result = result.len(),
        "computed features after operation"
    );
    Ok(result)
}

/// Tolerant closures of every feature in `features` that patches one in `removed`
fn patches_for(
    removed: &CandidateSet,
    features: &CandidateSet,
    registry: &dyn FeatureRegistry,
) -> Result<CandidateSet, StructuralError> {
    let mut patches = CandidateSet::new();
    for target in removed {
        for candidate in features.iter().filter(|c| c.patches(target)) {
            patches.extend(&closure(candidate, registry, true)?);
        }
    }
    Ok(patches)
}

/// Features configured after reverting to `config`: its own snapshot
pub fn after_revert(
    config: &InstallConfiguration,
    registry: &dyn FeatureRegistry,
) -> Result<CandidateSet, StructuralError> {
    configured_features(config, registry)
}

/// Features configured after enabling the features of `delta`.
///
/// Per site, delta features join the configured ones, then only the highest
/// version of each id is kept. Patches of dropped versions are dropped too.
pub fn after_delta(
    base: &InstallConfiguration,
    delta: &SessionDelta,
    registry: &dyn FeatureRegistry,
) -> Result<CandidateSet, StructuralError> {
    let mut result = CandidateSet::new();

    for site in &base.sites {
        let mut site_features = CandidateSet::new();
        for id in &site.configured {
            site_features.insert(registry.resolve(id)?);
        }
        for id in delta.features_for_site(&site.url) {
            if !site_features.contains(id) {
                site_features.insert(registry.resolve(id)?);
            }
        }

        let superseded: CandidateSet = site_features
            .iter()
            .filter(|f| {
                site_features
                    .with_id(f.id.id())
                    .any(|other| other.version() > f.version())
            })
            .cloned()
            .collect();

        if !superseded.is_empty() {
            let patches = patches_for(&superseded, &site_features, registry)?;
            debug!(
                site = %site.url,
                superseded = superseded.len(),
                patches = patches.len(),
                "reduced site features to highest versions"
            );
            site_features.subtract(&superseded);
            site_features.subtract(&patches);
        }

        result.extend(&site_features);
    }

    Ok(result)
}
