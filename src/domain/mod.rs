//! Domain models for update-guard
//!
//! Features, versions, configurations and pending changes, without any
//! I/O concerns.

mod version;
mod feature;
mod registry;
mod configuration;
mod change;
mod graph;

pub use version::{Version, VersionError, VersionedIdentifier};
pub use feature::{platform_tokens, Feature, FeatureRef, Import, ImportKind, IncludedFeature, MatchRule};
pub use registry::{FeatureRegistry, InMemoryRegistry, RegistryError};
pub use configuration::{ConfiguredSite, DeltaFeature, DeltaKind, InstallConfiguration, SessionDelta};
pub use change::PendingChange;
pub use graph::{GraphError, IncludeEdge, IncludeGraph};
