//! Constraint checker
//!
//! Evaluates a candidate feature set against four independent rules and
//! collects every violation found:
//!
//! 1. environment: each feature's os/ws/arch lists include the host's
//! 2. platform: every bootstrap plugin is contributed by some feature
//! 3. primary: the primary feature is configured
//! 4. prerequisites: every import is satisfied by some compatible version

use tracing::debug;

use super::candidate::{CandidateSet, PluginSet};
use super::host::Host;
use super::violation::{Violation, ViolationKind, Violations};
use crate::domain::{platform_tokens, Feature, Import, ImportKind, MatchRule};

/// Checks candidate sets against the host's constraints.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintChecker<'a> {
    host: &'a Host,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self { host }
    }

    /// Runs all checks; an empty result means the set is valid.
    pub fn check(&self, features: &CandidateSet) -> Violations {
        let plugins = PluginSet::from_features(features);
        let mut violations = Violations::new();

        self.check_environment(features, &mut violations);
        self.check_platform(&plugins, &mut violations);
        self.check_primary(features, &mut violations);
        self.check_prerequisites(features, &plugins, &mut violations);

        debug!(
            features = features.len(),
            plugins = plugins.len(),
            violations = violations.len(),
            "checked constraints"
        );
        violations
    }

    /// Every declared os/ws/arch list must contain the host's value.
    pub fn check_environment(&self, features: &CandidateSet, violations: &mut Violations) {
        for feature in features {
            let axes = [
                (feature.os.as_deref(), &self.host.os, ViolationKind::UnsupportedOs, "unsupported operating system"),
                (feature.ws.as_deref(), &self.host.ws, ViolationKind::UnsupportedWs, "unsupported windowing system"),
                (feature.arch.as_deref(), &self.host.arch, ViolationKind::UnsupportedArch, "unsupported architecture"),
            ];
            for (declared, current, kind, message) in axes {
                let tokens = platform_tokens(declared);
                if !tokens.is_empty() && !tokens.contains(&current.as_str()) {
                    violations.push(Violation::for_feature(feature, kind, message));
                }
            }
        }
    }

    /// One violation if any bootstrap plugin is missing, whatever the count.
    pub fn check_platform(&self, plugins: &PluginSet, violations: &mut Violations) {
        if let Some(missing) = self
            .host
            .bootstrap_plugins
            .iter()
            .find(|id| !plugins.contains_id(id))
        {
            debug!(plugin = %missing, "bootstrap plugin missing");
            violations.push(Violation::system(
                ViolationKind::MissingPlatform,
                "platform is missing from the resulting configuration",
            ));
        }
    }

    pub fn check_primary(&self, features: &CandidateSet, violations: &mut Violations) {
        if !features.contains_id(&self.host.primary_feature) {
            violations.push(Violation::system(
                ViolationKind::MissingPrimary,
                format!(
                    "primary feature \"{}\" is missing from the resulting configuration",
                    self.host.primary_feature
                ),
            ));
        }
    }

    pub fn check_prerequisites(
        &self,
        features: &CandidateSet,
        plugins: &PluginSet,
        violations: &mut Violations,
    ) {
        for feature in features {
            for import in &feature.imports {
                let satisfied = match import.kind {
                    ImportKind::Plugin => plugins.satisfies(import),
                    ImportKind::Feature => features
                        .with_id(import.target.id())
                        .filter(|candidate| candidate.id != feature.id)
                        .any(|candidate| import.is_satisfied_by(&candidate.version())),
                };

                if !satisfied {
                    violations.push(Violation::for_feature(
                        feature,
                        ViolationKind::UnsatisfiedPrerequisite,
                        prerequisite_message(import),
                    ));
                }
            }
        }
    }
}

/// Names the rule that was applied, so users can tell the cases apart
fn prerequisite_message(import: &Import) -> String {
    let target = import.kind.label();
    let id = import.target.id();
    let version = import.target.version();

    if import.ignores_version() {
        return format!("requires {} \"{}\"", target, id);
    }

    match import.effective_rule() {
        MatchRule::Perfect => format!("requires {} \"{}\", exactly version {}", target, id, version),
        MatchRule::Equivalent => format!(
            "requires {} \"{}\", version equivalent to {}",
            target, id, version
        ),
        MatchRule::GreaterOrEqual => format!(
            "requires {} \"{}\", version {} or later",
            target, id, version
        ),
        MatchRule::Compatible | MatchRule::None => format!(
            "requires {} \"{}\", version compatible with {}",
            target, id, version
        ),
    }
}

/// Checks a single feature's environment against the host
pub fn supports_host(feature: &Feature, host: &Host) -> bool {
    [
        (feature.os.as_deref(), &host.os),
        (feature.ws.as_deref(), &host.ws),
        (feature.arch.as_deref(), &host.arch),
    ]
    .into_iter()
    .all(|(declared, current)| {
        let tokens = platform_tokens(declared);
        tokens.is_empty() || tokens.contains(&current.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VersionedIdentifier;
    use std::sync::Arc;

    fn vid(s: &str) -> VersionedIdentifier {
        s.parse().unwrap()
    }

    fn host() -> Host {
        Host::new("macosx", "cocoa", "x86_64")
            .with_bootstrap_plugins(["org.platform.boot"])
            .with_primary_feature("com.acme.ide")
    }

    /// Primary and platform features that satisfy the system-wide checks
    fn baseline() -> Vec<Feature> {
        vec![
            Feature::new(vid("com.acme.ide@1.0.0")),
            Feature::new(vid("org.platform@3.0.0")).with_plugin(vid("org.platform.boot@3.0.0")),
        ]
    }

    fn set(features: impl IntoIterator<Item = Feature>) -> CandidateSet {
        features.into_iter().map(Arc::new).collect()
    }

    fn with_lib(import: Import, available: &str) -> CandidateSet {
        let mut features = baseline();
        features.push(Feature::new(vid("lib.provider@1.0.0")).with_plugin(vid(available)));
        features.push(Feature::new(vid("consumer@1.0.0")).with_import(import));
        set(features)
    }

    #[test]
    fn valid_baseline() {
        let host = host();
        assert!(ConstraintChecker::new(&host).check(&set(baseline())).is_empty());
    }

    #[test]
    fn environment_mismatch_names_feature() {
        let host = host();
        let mut features = baseline();
        features.push(Feature::new(vid("native@1.0.0")).with_os("win32,linux"));
        let violations = ConstraintChecker::new(&host).check(&set(features));

        assert_eq!(violations.len(), 1);
        let v = &violations.all()[0];
        assert_eq!(v.kind, ViolationKind::UnsupportedOs);
        assert_eq!(v.feature.as_ref().unwrap().id, vid("native@1.0.0"));
    }

    #[test]
    fn environment_checks_every_axis() {
        let host = host();
        let mut features = baseline();
        features.push(
            Feature::new(vid("native@1.0.0"))
                .with_os("linux")
                .with_ws("gtk")
                .with_arch("x86_64"),
        );
        let violations = ConstraintChecker::new(&host).check(&set(features));

        let kinds: Vec<_> = violations.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::UnsupportedOs, ViolationKind::UnsupportedWs]);
    }

    #[test]
    fn undeclared_environment_always_passes() {
        let host = host();
        let portable = Feature::new(vid("portable@1.0.0")).with_os(" ");
        assert!(supports_host(&portable, &host));
        assert!(supports_host(&Feature::new(vid("x@1.0.0")).with_os("linux, macosx"), &host));
        assert!(!supports_host(&Feature::new(vid("x@1.0.0")).with_arch("ppc"), &host));
    }

    #[test]
    fn missing_bootstrap_reported_once() {
        let host = host().with_bootstrap_plugins(["boot.a", "boot.b"]);
        let violations = ConstraintChecker::new(&host).check(&set(baseline()));
        assert_eq!(violations.of_kind(ViolationKind::MissingPlatform).count(), 1);
    }

    #[test]
    fn bootstrap_presence_is_version_agnostic() {
        let host = host();
        let features = set([
            Feature::new(vid("com.acme.ide@1.0.0")),
            Feature::new(vid("org.platform@1.0.0")).with_plugin(vid("org.platform.boot@0.1.0")),
        ]);
        assert!(ConstraintChecker::new(&host).check(&features).is_empty());
    }

    #[test]
    fn missing_primary_is_system_wide() {
        let host = host();
        let features = set([baseline().remove(1)]);
        let violations = ConstraintChecker::new(&host).check(&features);

        assert_eq!(violations.len(), 1);
        let v = &violations.all()[0];
        assert_eq!(v.kind, ViolationKind::MissingPrimary);
        assert!(v.is_system_wide());
    }

    #[test]
    fn prerequisite_matching_table() {
        let host = host();
        let checker = ConstraintChecker::new(&host);
        let compatible = Import::plugin(vid("libX@1.2.0"), MatchRule::Compatible);

        assert!(checker.check(&with_lib(compatible.clone(), "libX@1.2.0")).is_empty());
        assert!(checker.check(&with_lib(compatible.clone(), "libX@1.3.5")).is_empty());
        assert_eq!(checker.check(&with_lib(compatible, "libX@2.0.0")).len(), 1);

        let perfect = Import::plugin(vid("libX@1.2.0"), MatchRule::Perfect);
        assert_eq!(checker.check(&with_lib(perfect, "libX@1.2.1")).len(), 1);

        for rule in [MatchRule::None, MatchRule::Perfect, MatchRule::Equivalent, MatchRule::GreaterOrEqual] {
            let any = Import::plugin(vid("libX@0.0.0"), rule);
            assert!(checker.check(&with_lib(any, "libX@7.1.3")).is_empty());
        }
    }

    #[test]
    fn prerequisite_messages_name_the_rule() {
        let host = host();
        let checker = ConstraintChecker::new(&host);

        let compatible = checker.check(&with_lib(
            Import::plugin(vid("libX@1.2.0"), MatchRule::None),
            "libX@2.0.0",
        ));
        assert_eq!(
            compatible.all()[0].message,
            "requires plug-in \"libX\", version compatible with 1.2.0"
        );

        let perfect = checker.check(&with_lib(
            Import::plugin(vid("libX@1.2.0"), MatchRule::Perfect),
            "libX@1.2.1",
        ));
        assert_eq!(
            perfect.all()[0].message,
            "requires plug-in \"libX\", exactly version 1.2.0"
        );
    }

    #[test]
    fn feature_prerequisite_skips_self() {
        let host = host();
        let mut features = baseline();
        features.push(
            Feature::new(vid("selfish@1.0.0"))
                .with_import(Import::feature(vid("selfish@1.0.0"), MatchRule::Perfect)),
        );
        let violations = ConstraintChecker::new(&host).check(&set(features));

        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations.all()[0].message,
            "requires feature \"selfish\", exactly version 1.0.0"
        );
    }

    #[test]
    fn feature_prerequisite_matches_features_not_plugins() {
        let host = host();
        let mut features = baseline();
        features.push(
            Feature::new(vid("addon@1.0.0"))
                .with_import(Import::feature(vid("org.platform@2.0.0"), MatchRule::GreaterOrEqual))
                .with_import(Import::feature(vid("org.platform.boot@0.0.0"), MatchRule::None)),
        );
        let violations = ConstraintChecker::new(&host).check(&set(features));

        // platform feature satisfies the first; the boot plugin is not a feature
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.all()[0].message, "requires feature \"org.platform.boot\"");
    }

    #[test]
    fn violations_ordered_by_check() {
        let host = host();
        let features = set([Feature::new(vid("native@1.0.0"))
            .with_os("win32")
            .with_import(Import::plugin(vid("missing@1.0.0"), MatchRule::None))]);
        let violations = ConstraintChecker::new(&host).check(&features);

        let kinds: Vec<_> = violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::UnsupportedOs,
                ViolationKind::MissingPlatform,
                ViolationKind::MissingPrimary,
                ViolationKind::UnsatisfiedPrerequisite,
            ]
        );
    }
}
