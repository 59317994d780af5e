//! Feature domain model
//!
//! A feature is a versioned, installable unit. It contributes plugins,
//! includes other features, and imports (requires) plugins or features
//! at some compatible version. Features are immutable once loaded.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::registry::{FeatureRegistry, RegistryError};
use super::version::{Version, VersionedIdentifier};

/// Version-compatibility policy of an import or include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// No rule declared (imports treat this as compatible)
    #[default]
    None,
    Perfect,
    Equivalent,
    Compatible,
    GreaterOrEqual,
}

impl MatchRule {
    /// Rule actually applied to an import
    pub fn for_import(self) -> MatchRule {
        match self {
            MatchRule::None => MatchRule::Compatible,
            rule => rule,
        }
    }

    /// Returns true if `candidate` satisfies `required` under this rule.
    ///
    /// `None` is taken literally here and only accepts an exact match;
    /// imports go through [`MatchRule::for_import`] first.
    pub fn accepts(self, candidate: &Version, required: &Version) -> bool {
        match self {
            MatchRule::None | MatchRule::Perfect => candidate.is_perfect(required),
            MatchRule::Equivalent => candidate.is_equivalent_to(required),
            MatchRule::Compatible => candidate.is_compatible_with(required),
            MatchRule::GreaterOrEqual => candidate.is_greater_or_equal(required),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchRule::None => "none",
            MatchRule::Perfect => "perfect",
            MatchRule::Equivalent => "equivalent",
            MatchRule::Compatible => "compatible",
            MatchRule::GreaterOrEqual => "greater_or_equal",
        }
    }
}

/// What an import refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    #[default]
    Plugin,
    Feature,
}

impl ImportKind {
    pub fn label(&self) -> &'static str {
        match self {
            ImportKind::Plugin => "plug-in",
            ImportKind::Feature => "feature",
        }
    }
}

/// A prerequisite declared by a feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Import {
    pub target: VersionedIdentifier,

    #[serde(default)]
    pub rule: MatchRule,

    #[serde(default)]
    pub kind: ImportKind,

    /// Marks the importing feature as a patch of the target feature
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub patch: bool,
}

impl Import {
    /// Creates a plugin import with the given rule
    pub fn plugin(target: VersionedIdentifier, rule: MatchRule) -> Self {
        Self {
            target,
            rule,
            kind: ImportKind::Plugin,
            patch: false,
        }
    }

    /// Creates a feature import with the given rule
    pub fn feature(target: VersionedIdentifier, rule: MatchRule) -> Self {
        Self {
            target,
            rule,
            kind: ImportKind::Feature,
            patch: false,
        }
    }

    /// Creates a patch import: the owning feature patches `target`
    pub fn patch(target: VersionedIdentifier) -> Self {
        Self {
            target,
            rule: MatchRule::Perfect,
            kind: ImportKind::Feature,
            patch: true,
        }
    }

    /// Target version `0.0.0` accepts any version
    pub fn ignores_version(&self) -> bool {
        self.target.version().is_unconstrained()
    }

    pub fn effective_rule(&self) -> MatchRule {
        self.rule.for_import()
    }

    /// Returns true if a unit with this id and `version` satisfies the import
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.ignores_version() || self.effective_rule().accepts(version, &self.target.version())
    }
}

/// A lazy reference to another feature
#[derive(Debug, Clone)]
pub enum FeatureRef {
    Unresolved(VersionedIdentifier),
    Resolved(Arc<Feature>),
}

impl FeatureRef {
    pub fn identifier(&self) -> &VersionedIdentifier {
        match self {
            FeatureRef::Unresolved(vid) => vid,
            FeatureRef::Resolved(feature) => &feature.id,
        }
    }

    /// Resolves the reference, going through the registry if needed
    pub fn resolve(&self, registry: &dyn FeatureRegistry) -> Result<Arc<Feature>, RegistryError> {
        match self {
            FeatureRef::Resolved(feature) => Ok(Arc::clone(feature)),
            FeatureRef::Unresolved(vid) => registry.resolve(vid),
        }
    }
}

impl From<VersionedIdentifier> for FeatureRef {
    fn from(vid: VersionedIdentifier) -> Self {
        FeatureRef::Unresolved(vid)
    }
}

impl From<Arc<Feature>> for FeatureRef {
    fn from(feature: Arc<Feature>) -> Self {
        FeatureRef::Resolved(feature)
    }
}

impl PartialEq for FeatureRef {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for FeatureRef {}

impl Serialize for FeatureRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.identifier().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        VersionedIdentifier::deserialize(deserializer).map(FeatureRef::Unresolved)
    }
}

/// An `<includes>` edge to a nested feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludedFeature {
    pub feature: FeatureRef,

    /// Optional children may be missing without breaking the parent
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    pub rule: MatchRule,
}

impl IncludedFeature {
    pub fn new(feature: impl Into<FeatureRef>) -> Self {
        Self {
            feature: feature.into(),
            optional: false,
            rule: MatchRule::None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn identifier(&self) -> &VersionedIdentifier {
        self.feature.identifier()
    }

    /// Returns true if this include refers to `candidate` under its match rule
    pub fn refers_to(&self, candidate: &VersionedIdentifier) -> bool {
        let target = self.identifier();
        target.same_id(candidate) && self.rule.accepts(&candidate.version(), &target.version())
    }
}

/// Includes accept either a bare `"id@version"` or a full object
impl<'de> Deserialize<'de> for IncludedFeature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Full {
            feature: FeatureRef,
            #[serde(default)]
            optional: bool,
            #[serde(default)]
            rule: MatchRule,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(FeatureRef),
            Full(Full),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(feature) => IncludedFeature::new(feature),
            Repr::Full(full) => IncludedFeature {
                feature: full.feature,
                optional: full.optional,
                rule: full.rule,
            },
        })
    }
}

/// An installable feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: VersionedIdentifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Comma-separated operating systems (absent matches any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Comma-separated windowing systems (absent matches any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,

    /// Comma-separated architectures (absent matches any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    #[serde(default)]
    pub imports: Vec<Import>,

    #[serde(default)]
    pub includes: Vec<IncludedFeature>,

    #[serde(default)]
    pub plugins: Vec<VersionedIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Exclusive features must be installed on their own
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclusive: bool,
}

impl Feature {
    /// Creates a bare feature with no plugins, imports or includes
    pub fn new(id: VersionedIdentifier) -> Self {
        Self {
            id,
            label: None,
            os: None,
            ws: None,
            arch: None,
            imports: Vec::new(),
            includes: Vec::new(),
            plugins: Vec::new(),
            license: None,
            exclusive: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn with_ws(mut self, ws: impl Into<String>) -> Self {
        self.ws = Some(ws.into());
        self
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn with_plugin(mut self, plugin: VersionedIdentifier) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_import(mut self, import: Import) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_include(mut self, include: IncludedFeature) -> Self {
        self.includes.push(include);
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Display label, falling back to the id
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.id())
    }

    pub fn version(&self) -> Version {
        self.id.version()
    }

    /// A feature with at least one patch import is a patch
    pub fn is_patch(&self) -> bool {
        self.imports.iter().any(|i| i.patch)
    }

    /// Returns true if this feature is a patch of `target`
    pub fn patches(&self, target: &Feature) -> bool {
        self.imports.iter().any(|i| {
            i.patch && i.target.same_id(&target.id) && i.is_satisfied_by(&target.version())
        })
    }

    /// Returns true if the feature carries non-blank license text
    pub fn has_license(&self) -> bool {
        self.license
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }

    /// Returns true if `child` is included by this feature.
    ///
    /// With `optional_only`, the matching include must also be optional.
    pub fn includes_feature(&self, child: &VersionedIdentifier, optional_only: bool) -> bool {
        self.includes
            .iter()
            .find(|include| include.refers_to(child))
            .map(|include| !optional_only || include.optional)
            .unwrap_or(false)
    }
}

/// Features are identified by their versioned identifier
impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Feature {}

impl Hash for Feature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Splits a comma-separated platform attribute into trimmed, non-empty tokens
pub fn platform_tokens(list: Option<&str>) -> Vec<&str> {
    list.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
