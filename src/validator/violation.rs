//! Constraint violation types.

use serde::Serialize;
use std::fmt;

use crate::domain::{Feature, VersionedIdentifier};

/// What rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnsupportedOs,
    UnsupportedWs,
    UnsupportedArch,
    MissingPlatform,
    MissingPrimary,
    UnsatisfiedPrerequisite,
    IncludeCycle,
    MissingFeature,
    Conflict,
    Exclusive,
    NoLicense,
    PatchRegression,
    PatchMissingTarget,
    PatchUnconfigure,
    OptionalChild,
    WrongTimeline,
}

impl ViolationKind {
    /// Structural problems abort a validation; the rest are findings.
    pub fn is_structural(&self) -> bool {
        matches!(self, ViolationKind::IncludeCycle | ViolationKind::MissingFeature)
    }
}

/// The feature a violation is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureLabel {
    pub id: VersionedIdentifier,
    pub label: String,
}

impl FeatureLabel {
    pub fn of(feature: &Feature) -> Self {
        Self {
            id: feature.id.clone(),
            label: feature.label().to_string(),
        }
    }
}

impl fmt::Display for FeatureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id.version())
    }
}

/// A single finding against a candidate configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Offending feature; `None` for system-wide violations.
    pub feature: Option<FeatureLabel>,
    pub kind: ViolationKind,
    /// Human-readable reason.
    pub message: String,
}

impl Violation {
    /// Create a violation naming a feature.
    pub fn for_feature(feature: &Feature, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            feature: Some(FeatureLabel::of(feature)),
            kind,
            message: message.into(),
        }
    }

    /// Create a system-wide violation.
    pub fn system(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            feature: None,
            kind,
            message: message.into(),
        }
    }

    pub fn is_system_wide(&self) -> bool {
        self.feature.is_none()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.feature {
            Some(feature) => write!(f, "{}: {}", feature, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Ordered collection of violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Create a new empty violations collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Put a violation in front of all others.
    pub fn prepend(&mut self, violation: Violation) {
        self.violations.insert(0, violation);
    }

    /// Check if there are any violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Get all violations.
    pub fn all(&self) -> &[Violation] {
        &self.violations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    /// Get the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Violations of a given kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    /// Merge another violations collection.
    pub fn merge(&mut self, other: Violations) {
        self.violations.extend(other.violations);
    }
}

impl From<Violation> for Violations {
    fn from(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}
