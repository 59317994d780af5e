//! Install configurations and session deltas
//!
//! An install configuration is a snapshot of which features are configured
//! on which sites. Configurations that share a timeline can be reverted to
//! one another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::version::VersionedIdentifier;

/// A site (install location) and its features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredSite {
    /// Location of the site
    pub url: String,

    /// Features present on the site but not configured
    #[serde(default)]
    pub features: Vec<VersionedIdentifier>,

    /// Features present on the site and configured
    #[serde(default)]
    pub configured: Vec<VersionedIdentifier>,
}

impl ConfiguredSite {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            features: Vec::new(),
            configured: Vec::new(),
        }
    }

    pub fn with_configured(mut self, id: VersionedIdentifier) -> Self {
        self.configured.push(id);
        self
    }

    pub fn with_unconfigured(mut self, id: VersionedIdentifier) -> Self {
        self.features.push(id);
        self
    }

    pub fn is_configured(&self, id: &VersionedIdentifier) -> bool {
        self.configured.contains(id)
    }

    /// All features on the site, configured ones first
    pub fn available(&self) -> impl Iterator<Item = &VersionedIdentifier> {
        self.configured
            .iter()
            .chain(self.features.iter().filter(|id| !self.configured.contains(id)))
    }
}

/// A snapshot of configured sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallConfiguration {
    pub label: String,

    /// Creation time of the first configuration of this timeline
    #[serde(default)]
    pub timeline: DateTime<Utc>,

    #[serde(default)]
    pub sites: Vec<ConfiguredSite>,
}

impl InstallConfiguration {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            timeline: DateTime::<Utc>::default(),
            sites: Vec::new(),
        }
    }

    pub fn with_site(mut self, site: ConfiguredSite) -> Self {
        self.sites.push(site);
        self
    }

    pub fn with_timeline(mut self, timeline: DateTime<Utc>) -> Self {
        self.timeline = timeline;
        self
    }

    /// Configured features across all sites, in site order
    pub fn configured_features(&self) -> impl Iterator<Item = &VersionedIdentifier> {
        self.sites.iter().flat_map(|site| site.configured.iter())
    }

    pub fn site(&self, url: &str) -> Option<&ConfiguredSite> {
        self.sites.iter().find(|site| site.url == url)
    }

    pub fn same_timeline(&self, other: &InstallConfiguration) -> bool {
        self.timeline == other.timeline
    }
}

/// Kind of change recorded by another session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// Newly discovered features to be enabled
    #[default]
    Enable,
    Disable,
}

/// A feature referenced by a session delta, on a given site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaFeature {
    pub site: String,
    pub feature: VersionedIdentifier,
}

/// Changes made outside the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionDelta {
    #[serde(default)]
    pub kind: DeltaKind,

    #[serde(default)]
    pub features: Vec<DeltaFeature>,
}

impl SessionDelta {
    pub fn enable(features: impl IntoIterator<Item = (String, VersionedIdentifier)>) -> Self {
        Self {
            kind: DeltaKind::Enable,
            features: features
                .into_iter()
                .map(|(site, feature)| DeltaFeature { site, feature })
                .collect(),
        }
    }

    /// Delta features that belong to the given site
    pub fn features_for_site<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a VersionedIdentifier> {
        self.features
            .iter()
            .filter(move |delta| delta.site == url)
            .map(|delta| &delta.feature)
    }
}
