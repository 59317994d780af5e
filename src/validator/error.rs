//! Structural errors that abort a validation

use thiserror::Error;

use super::violation::{FeatureLabel, Violation, ViolationKind};
use crate::domain::{RegistryError, VersionedIdentifier};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StructuralError {
    /// The include graph below `feature` loops back on itself
    #[error("{feature}: included features form a cycle")]
    Cycle { feature: FeatureLabel },

    /// A required included feature of `feature` could not be resolved
    #[error("{feature}: cannot find included feature {}", .source.identifier())]
    MissingChild {
        feature: FeatureLabel,
        #[source]
        source: RegistryError,
    },

    /// A configured feature could not be loaded
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl StructuralError {
    /// Identifier of the feature the error is about
    pub fn identifier(&self) -> &VersionedIdentifier {
        match self {
            StructuralError::Cycle { feature } | StructuralError::MissingChild { feature, .. } => {
                &feature.id
            }
            StructuralError::Registry(err) => err.identifier(),
        }
    }

    /// Turns the error into the single violation reported for the call
    pub fn into_violation(self) -> Violation {
        match self {
            StructuralError::Cycle { feature } => Violation {
                feature: Some(feature),
                kind: ViolationKind::IncludeCycle,
                message: "included features form a cycle".to_string(),
            },
            StructuralError::MissingChild { feature, source } => Violation {
                feature: Some(feature),
                kind: ViolationKind::MissingFeature,
                message: format!("cannot find included feature {}", source.identifier()),
            },
            StructuralError::Registry(err) => {
                Violation::system(ViolationKind::MissingFeature, err.to_string())
            }
        }
    }
}
