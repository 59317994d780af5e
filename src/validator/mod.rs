//! Install-configuration validation
//!
//! Before a change is applied to the set of configured features, the
//! validator simulates the change and checks that the resulting
//! configuration is still consistent.

mod batch;
pub mod builder;
mod candidate;
mod checker;
mod diagnostic;
mod error;
mod host;
mod violation;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tracing::debug;

pub use candidate::{CandidateSet, PluginSet};
pub use checker::{supports_host, ConstraintChecker};
pub use diagnostic::{Diagnostic, DiagnosticRoot};
pub use error::StructuralError;
pub use host::{Host, ValidationPolicy};
pub use violation::{FeatureLabel, Violation, ViolationKind, Violations};

use crate::domain::{
    DeltaKind, Feature, FeatureRegistry, InstallConfiguration, PendingChange, SessionDelta,
};
use builder::{after_delta, after_operation, after_revert, closure, configured_features};

/// Validates changes against the current configuration.
///
/// Every entry point returns `None` when the change is acceptable, or a
/// diagnostic explaining why it is not.
pub struct Validator<'a> {
    registry: &'a dyn FeatureRegistry,
    current: &'a InstallConfiguration,
    host: &'a Host,
    policy: ValidationPolicy,
}

impl<'a> Validator<'a> {
    pub fn new(
        registry: &'a dyn FeatureRegistry,
        current: &'a InstallConfiguration,
        host: &'a Host,
    ) -> Self {
        Self {
            registry,
            current,
            host,
            policy: ValidationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the current configuration on its own
    pub fn validate_current_state(&self) -> Option<Diagnostic> {
        let violations = match self.initial_state() {
            Ok((_, violations)) | Err(violations) => violations,
        };
        Diagnostic::of_state(violations)
    }

    /// Checks a single install, uninstall, configure or unconfigure
    pub fn validate_change(&self, change: &PendingChange) -> Option<Diagnostic> {
        debug!(%change, "validating change");
        let (base, initial) = match self.initial_state() {
            Ok(state) => state,
            Err(initial) => return Diagnostic::report(initial.clone(), initial),
        };

        let status = self
            .change_violations(&base, change)
            .unwrap_or_else(|err| err.into_violation().into());
        Diagnostic::report(initial, status)
    }

    /// Checks enabling the features another session discovered
    pub fn validate_delta(&self, delta: &SessionDelta) -> Option<Diagnostic> {
        debug!(kind = ?delta.kind, features = delta.features.len(), "validating session delta");
        let initial = match self.initial_state() {
            Ok((_, initial)) => initial,
            Err(initial) => return Diagnostic::report(initial.clone(), initial),
        };

        let status = match delta.kind {
            DeltaKind::Enable => match after_delta(self.current, delta, self.registry) {
                Ok(after) => self.checker().check(&after),
                Err(err) => err.into_violation().into(),
            },
            DeltaKind::Disable => Violations::new(),
        };
        Diagnostic::report(initial, status)
    }

    /// Checks restoring a saved configuration.
    ///
    /// Besides the usual constraints, every restored feature must still have
    /// a fully resolvable include tree.
    pub fn validate_revert(&self, target: &InstallConfiguration) -> Option<Diagnostic> {
        debug!(target = %target.label, "validating revert");
        let initial = match self.initial_state() {
            Ok((_, initial)) => initial,
            Err(initial) => return Diagnostic::report(initial.clone(), initial),
        };

        if !self.current.same_timeline(target) {
            let violation = Violation::system(
                ViolationKind::WrongTimeline,
                format!(
                    "configuration \"{}\" belongs to a different timeline and cannot be restored",
                    target.label
                ),
            );
            return Diagnostic::report(initial, violation.into());
        }

        let status = match after_revert(target, self.registry) {
            Ok(after) => {
                let mut status = self.checker().check(&after);
                for feature in &after {
                    if let Err(err) = closure(feature, self.registry, false) {
                        status.push(err.into_violation());
                    }
                }
                status
            }
            Err(err) => err.into_violation().into(),
        };
        Diagnostic::report(initial, status)
    }

    fn checker(&self) -> ConstraintChecker<'a> {
        ConstraintChecker::new(self.host)
    }

    /// The configured features and their violations.
    ///
    /// Fails with the structural violation when the features cannot be loaded.
    fn initial_state(&self) -> Result<(CandidateSet, Violations), Violations> {
        let base = configured_features(self.current, self.registry)
            .map_err(|err| Violations::from(err.into_violation()))?;
        let violations = self.checker().check(&base);
        if !violations.is_empty() {
            debug!(violations = violations.len(), "initial configuration is broken");
        }
        Ok((base, violations))
    }

    fn change_violations(
        &self,
        base: &CandidateSet,
        change: &PendingChange,
    ) -> Result<Violations, StructuralError> {
        let mut violations = Violations::new();

        match change {
            PendingChange::Install { feature, replaces } => {
                if replaces.is_none() && feature.is_patch() {
                    self.check_unique(feature, base, &mut violations)?;
                }
            }
            PendingChange::Uninstall { feature } | PendingChange::Unconfigure { feature } => {
                if feature.is_patch() {
                    violations.push(Violation::for_feature(
                        feature,
                        ViolationKind::PatchUnconfigure,
                        "patches cannot be unconfigured; revert to a configuration saved before the patch was applied",
                    ));
                    return Ok(violations);
                }
            }
            PendingChange::Configure { feature } => {
                self.check_optional_child(feature, &mut violations);
            }
        }

        let after = after_operation(base, change.added(), change.removed(), self.registry)?;
        violations.merge(self.checker().check(&after));

        if let PendingChange::Install { feature, .. } = change {
            self.check_license(feature, &mut violations);
        }

        Ok(violations)
    }

    /// A patch installed on its own must not downgrade configured features
    /// and must find the features it patches.
    fn check_unique(
        &self,
        patch: &Arc<Feature>,
        base: &CandidateSet,
        violations: &mut Violations,
    ) -> Result<(), StructuralError> {
        for include in &patch.includes {
            let child = match include.feature.resolve(self.registry) {
                Ok(child) => child,
                Err(_) if include.optional => continue,
                Err(source) => {
                    return Err(StructuralError::MissingChild {
                        feature: FeatureLabel::of(patch),
                        source,
                    })
                }
            };

            let mut configured = base.with_id(child.id.id()).peekable();
            if configured.peek().is_none() {
                if !child.is_patch() && !include.optional {
                    violations.push(Violation::for_feature(
                        patch,
                        ViolationKind::PatchMissingTarget,
                        format!("patched feature \"{}\" is not configured", child.id.id()),
                    ));
                }
            } else if let Some(newer) = configured.find(|f| f.version() > child.version()) {
                violations.push(Violation::for_feature(
                    patch,
                    ViolationKind::PatchRegression,
                    format!(
                        "would replace {} with older version {}",
                        newer.id,
                        child.version()
                    ),
                ));
            }

            if child.is_patch() {
                self.check_unique(&child, base, violations)?;
            }
        }
        Ok(())
    }

    /// An optionally included feature is only configurable under a
    /// configured parent.
    fn check_optional_child(&self, feature: &Feature, violations: &mut Violations) {
        let mut has_parent = false;

        for site in &self.current.sites {
            for id in site.available() {
                let parent = match self.registry.resolve(id) {
                    Ok(parent) => parent,
                    Err(err) => {
                        debug!(%id, error = %err, "skipping unresolvable site feature");
                        continue;
                    }
                };
                if !parent.includes_feature(&feature.id, true) {
                    continue;
                }
                if site.is_configured(&parent.id) {
                    return;
                }
                has_parent = true;
            }
        }

        if has_parent {
            violations.push(Violation::for_feature(
                feature,
                ViolationKind::OptionalChild,
                "optional feature cannot be configured while its parent is not configured",
            ));
        }
    }

    fn check_license(&self, feature: &Feature, violations: &mut Violations) {
        if self.policy.require_license && !feature.has_license() {
            violations.push(Violation::for_feature(
                feature,
                ViolationKind::NoLicense,
                "feature does not provide a license agreement",
            ));
        }
    }
}
