//! Validation of several changes applied as one unit

use tracing::debug;

use super::builder::after_operation;
use super::diagnostic::Diagnostic;
use super::error::StructuralError;
use super::violation::{Violation, ViolationKind, Violations};
use super::{CandidateSet, Validator};
use crate::domain::PendingChange;

impl Validator<'_> {
    /// Checks a batch of changes as a transaction.
    ///
    /// Changes are simulated in order; the first step that breaks the
    /// configuration stops the batch and is blamed for the conflict.
    pub fn validate_batch(&self, changes: &[PendingChange]) -> Option<Diagnostic> {
        debug!(changes = changes.len(), "validating batch");
        let (base, initial) = match self.initial_state() {
            Ok(state) => state,
            Err(initial) => return Diagnostic::report(initial.clone(), initial),
        };

        let mut status = Violations::new();
        for change in changes {
            if let PendingChange::Install { feature, .. } = change {
                self.check_license(feature, &mut status);
            }
        }

        if changes.len() > 1 {
            for change in changes {
                let exclusive = change.added().filter(|feature| feature.exclusive);
                if let Some(feature) = exclusive {
                    status.push(Violation::for_feature(
                        feature,
                        ViolationKind::Exclusive,
                        "exclusive feature must be installed on its own",
                    ));
                }
            }
            if status.of_kind(ViolationKind::Exclusive).next().is_some() {
                return Diagnostic::report(initial, status);
            }
        }

        match self.simulate(base, changes) {
            Ok(conflict) => status.merge(conflict),
            Err(err) => status.push(err.into_violation()),
        }
        Diagnostic::report(initial, status)
    }

    /// Applies each change on top of the previous one, stopping at the
    /// first step with violations.
    fn simulate(
        &self,
        mut base: CandidateSet,
        changes: &[PendingChange],
    ) -> Result<Violations, StructuralError> {
        let checker = self.checker();

        for (step, change) in changes.iter().enumerate() {
            let after = after_operation(&base, change.added(), change.removed(), self.registry)?;
            let mut violations = checker.check(&after);

            if !violations.is_empty() {
                debug!(step, %change, violations = violations.len(), "batch step breaks configuration");
                violations.prepend(Violation::for_feature(
                    change.subject(),
                    ViolationKind::Conflict,
                    "conflicts with other selected updates",
                ));
                return Ok(violations);
            }

            debug!(step, %change, size = after.len(), "batch step accepted");
            base = after;
        }

        Ok(Violations::new())
    }
}
