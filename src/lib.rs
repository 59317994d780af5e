//! update-guard - Validates changes to an installed feature configuration
//!
//! Before features are installed, removed, enabled or disabled, the
//! resulting configuration is simulated and checked: every feature must
//! support the host platform, the bootstrap plugins and the primary feature
//! must stay present, prerequisites must be satisfied, and the include graph
//! must stay acyclic.

pub mod domain;
pub mod validator;
pub mod storage;
pub mod cli;

pub use domain::{Feature, InstallConfiguration, PendingChange, VersionedIdentifier};
pub use validator::{Diagnostic, Host, Validator, Violation};
