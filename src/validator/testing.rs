//! Test fixture: a small IDE product on a single site

use std::sync::Arc;

use super::{Host, Validator};
use crate::domain::{
    ConfiguredSite, Feature, FeatureRegistry, InMemoryRegistry, InstallConfiguration,
    VersionedIdentifier,
};

pub const PRIMARY: &str = "com.acme.ide@1.0.0";
pub const PLATFORM: &str = "org.platform@3.0.0";
const SITE: &str = "file:/opt/acme/";

pub fn vid(s: &str) -> VersionedIdentifier {
    s.parse().unwrap()
}

pub struct Fixture {
    pub registry: InMemoryRegistry,
    pub current: InstallConfiguration,
    pub host: Host,
}

impl Fixture {
    /// Primary and platform features configured, host requiring both
    pub fn new() -> Self {
        let registry = InMemoryRegistry::from_features([
            Feature::new(vid(PRIMARY)).with_label("Acme IDE"),
            Feature::new(vid(PLATFORM)).with_plugin(vid("org.platform.boot@3.0.0")),
        ]);
        let current = InstallConfiguration::new("current").with_site(
            ConfiguredSite::new(SITE)
                .with_configured(vid(PRIMARY))
                .with_configured(vid(PLATFORM)),
        );
        let host = Host::new("macosx", "cocoa", "x86_64")
            .with_bootstrap_plugins(["org.platform.boot"])
            .with_primary_feature("com.acme.ide");

        Self {
            registry,
            current,
            host,
        }
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.registry, &self.current, &self.host)
    }

    pub fn add(&mut self, feature: Feature) -> Arc<Feature> {
        self.registry.insert(feature)
    }

    pub fn feature(&self, id: &str) -> Arc<Feature> {
        self.registry.resolve(&vid(id)).unwrap()
    }

    /// Marks a registered feature as configured on the site
    pub fn configure(&mut self, id: VersionedIdentifier) {
        self.current.sites[0].configured.push(id);
    }

    /// Puts a registered feature on the site without configuring it
    pub fn make_available(&mut self, id: VersionedIdentifier) {
        self.current.sites[0].features.push(id);
    }

    pub fn site_url(&self) -> String {
        SITE.to_string()
    }
}
