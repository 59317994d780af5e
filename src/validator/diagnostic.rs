//! Aggregated validation results

use serde::Serialize;
use std::fmt;

use super::violation::{Violation, Violations};

/// Why a diagnostic was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticRoot {
    /// The configuration is broken before any change is applied
    InitialStateBroken,
    /// The change would break a configuration
    ChangeWouldBreak,
}

impl DiagnosticRoot {
    pub fn message(&self) -> &'static str {
        match self {
            DiagnosticRoot::InitialStateBroken => "the initial configuration is already broken",
            DiagnosticRoot::ChangeWouldBreak => "the proposed change would break the configuration",
        }
    }
}

/// A root message with one child per violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub root: DiagnosticRoot,
    pub message: String,
    pub children: Vec<Violation>,
}

impl Diagnostic {
    pub fn new(root: DiagnosticRoot, children: Violations) -> Self {
        Self {
            root,
            message: root.message().to_string(),
            children: children.into_iter().collect(),
        }
    }

    /// Picks the report for a change.
    ///
    /// A change without violations is valid even on a broken initial state.
    /// When both are broken, the initial-state violations are reported since
    /// the change cannot be judged on its own.
    pub fn report(initial: Violations, change: Violations) -> Option<Self> {
        if change.is_empty() {
            None
        } else if !initial.is_empty() {
            Some(Self::new(DiagnosticRoot::InitialStateBroken, initial))
        } else {
            Some(Self::new(DiagnosticRoot::ChangeWouldBreak, change))
        }
    }

    /// Report for a state checked on its own
    pub fn of_state(violations: Violations) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self::new(DiagnosticRoot::ChangeWouldBreak, violations))
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.message)?;
        for child in &self.children {
            write!(f, "\n  - {}", child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ViolationKind;

    fn violations(messages: &[&str]) -> Violations {
        let mut v = Violations::new();
        for message in messages {
            v.push(Violation::system(ViolationKind::MissingPlatform, *message));
        }
        v
    }

    #[test]
    fn clean_change_is_valid() {
        assert!(Diagnostic::report(violations(&["broken"]), Violations::new()).is_none());
    }

    #[test]
    fn broken_change_on_clean_state() {
        let diagnostic = Diagnostic::report(Violations::new(), violations(&["change"])).unwrap();
        assert_eq!(diagnostic.root, DiagnosticRoot::ChangeWouldBreak);
        assert_eq!(diagnostic.children[0].message, "change");
    }

    #[test]
    fn broken_change_on_broken_state_reports_initial() {
        let diagnostic =
            Diagnostic::report(violations(&["initial"]), violations(&["change", "more"])).unwrap();
        assert_eq!(diagnostic.root, DiagnosticRoot::InitialStateBroken);
        assert_eq!(diagnostic.len(), 1);
        assert_eq!(diagnostic.children[0].message, "initial");
    }

    #[test]
    fn display_lists_children() {
        let diagnostic = Diagnostic::of_state(violations(&["a", "b"])).unwrap();
        assert_eq!(
            diagnostic.to_string(),
            "the proposed change would break the configuration:\n  - a\n  - b"
        );
    }
}
