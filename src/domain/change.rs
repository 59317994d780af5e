//! Pending changes to the set of configured features

use std::fmt;
use std::sync::Arc;

use super::feature::Feature;

/// An operation the user is about to perform
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    /// Install `feature`, replacing `replaces` if given (an update)
    Install {
        feature: Arc<Feature>,
        replaces: Option<Arc<Feature>>,
    },
    Uninstall {
        feature: Arc<Feature>,
    },
    Configure {
        feature: Arc<Feature>,
    },
    Unconfigure {
        feature: Arc<Feature>,
    },
}

impl PendingChange {
    pub fn install(feature: Arc<Feature>) -> Self {
        PendingChange::Install {
            feature,
            replaces: None,
        }
    }

    pub fn update(feature: Arc<Feature>, replaces: Arc<Feature>) -> Self {
        PendingChange::Install {
            feature,
            replaces: Some(replaces),
        }
    }

    /// Feature that ends up configured after the change
    pub fn added(&self) -> Option<&Arc<Feature>> {
        match self {
            PendingChange::Install { feature, .. } | PendingChange::Configure { feature } => {
                Some(feature)
            }
            PendingChange::Uninstall { .. } | PendingChange::Unconfigure { .. } => None,
        }
    }

    /// Feature that stops being configured after the change
    pub fn removed(&self) -> Option<&Arc<Feature>> {
        match self {
            PendingChange::Install { replaces, .. } => replaces.as_ref(),
            PendingChange::Uninstall { feature } | PendingChange::Unconfigure { feature } => {
                Some(feature)
            }
            PendingChange::Configure { .. } => None,
        }
    }

    /// The feature the change is about
    pub fn subject(&self) -> &Arc<Feature> {
        match self {
            PendingChange::Install { feature, .. }
            | PendingChange::Uninstall { feature }
            | PendingChange::Configure { feature }
            | PendingChange::Unconfigure { feature } => feature,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PendingChange::Install { .. } => "install",
            PendingChange::Uninstall { .. } => "uninstall",
            PendingChange::Configure { .. } => "configure",
            PendingChange::Unconfigure { .. } => "unconfigure",
        }
    }
}

impl fmt::Display for PendingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingChange::Install {
                feature,
                replaces: Some(old),
            } => write!(f, "install {} (replacing {})", feature.id, old.id),
            _ => write!(f, "{} {}", self.kind(), self.subject().id),
        }
    }
}
