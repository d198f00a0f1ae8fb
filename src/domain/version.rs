//! Module version values
//!
//! One canonical internal representation (a semantic version) and one
//! canonical display form (`v`-prefixed). Parsing accepts the prefix, every
//! other part of the crate compares and formats through this type, so the
//! prefix handling never leaks anywhere else.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A module version with total order
///
/// `1.0.0` and `v1.0.0` parse to the same value; display always emits the
/// `v`-prefixed form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(semver::Version);

impl Version {
    /// Parses a version string, with or without a leading `v`
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let parsed = semver::Version::parse(bare)
            .map_err(|e| ParseError::version(trimmed, e.to_string()))?;
        Ok(Self(parsed))
    }

    /// The raw numeric form without the `v` prefix (`1.2.3`)
    pub fn raw(&self) -> String {
        self.0.to_string()
    }

    /// Access to the underlying semantic version for constraint matching
    pub(crate) fn semver(&self) -> &semver::Version {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw()
    }
}
