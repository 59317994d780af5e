//! Versions and versioned identifiers
//!
//! Format:
//! - Version: `{major}.{minor}.{service}` (e.g., `1.2.0`). Missing trailing
//!   components default to zero; a fourth qualifier component is accepted and
//!   ignored (`2.1.0.v20030521`).
//! - Versioned identifier: `{id}@{version}` (e.g., `org.eclipse.platform@2.1.0`)
//!
//! Ordering is lexicographic on `(major, minor, service)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Invalid version: expected '{{major}}.{{minor}}.{{service}}', got '{0}'")]
    InvalidVersion(String),

    #[error("Invalid versioned identifier: expected '{{id}}@{{version}}', got '{0}'")]
    InvalidIdentifier(String),
}

/// A three-component version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub service: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, service: u32) -> Self {
        Self {
            major,
            minor,
            service,
        }
    }

    /// `0.0.0` means "any version" when used as an import target
    pub fn is_unconstrained(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.service == 0
    }

    /// Exactly the same version
    pub fn is_perfect(&self, required: &Version) -> bool {
        self == required
    }

    /// Same major and minor, service at least the required one
    pub fn is_equivalent_to(&self, required: &Version) -> bool {
        self.major == required.major
            && self.minor == required.minor
            && self.service >= required.service
    }

    /// Same major, and minor.service at least the required one
    pub fn is_compatible_with(&self, required: &Version) -> bool {
        if self.major != required.major {
            return false;
        }
        self.minor > required.minor
            || (self.minor == required.minor && self.service >= required.service)
    }

    pub fn is_greater_or_equal(&self, required: &Version) -> bool {
        self >= required
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.service)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionError::InvalidVersion(s.to_string()));
        }

        let mut parts = s.splitn(4, '.');
        let mut components = [0u32; 3];
        for slot in components.iter_mut() {
            match parts.next() {
                Some(part) => {
                    *slot = part
                        .parse()
                        .map_err(|_| VersionError::InvalidVersion(s.to_string()))?;
                }
                None => break,
            }
        }

        // Qualifier, if present, must at least be non-empty
        if let Some(qualifier) = parts.next() {
            if qualifier.is_empty() {
                return Err(VersionError::InvalidVersion(s.to_string()));
            }
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// The primary key of features and plugins: an id plus a version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionedIdentifier {
    id: String,
    version: Version,
}

impl VersionedIdentifier {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns true if both identifiers name the same unit, regardless of version
    pub fn same_id(&self, other: &VersionedIdentifier) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for VersionedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

impl FromStr for VersionedIdentifier {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (id, version) = s
            .rsplit_once('@')
            .ok_or_else(|| VersionError::InvalidIdentifier(s.to_string()))?;

        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(VersionError::InvalidIdentifier(s.to_string()));
        }

        Ok(Self {
            id: id.to_string(),
            version: version.parse()?,
        })
    }
}

impl TryFrom<String> for VersionedIdentifier {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionedIdentifier> for String {
    fn from(vid: VersionedIdentifier) -> Self {
        vid.to_string()
    }
}
