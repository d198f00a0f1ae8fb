//! Module identifiers
//!
//! Forge modules are identified by an owner and a short name. Both the
//! slash form (`puppetlabs/stdlib`) and the dash form (`puppetlabs-stdlib`)
//! appear in metadata and on the command line; internally only the dash
//! form exists.

use crate::error::ParseError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static OWNER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// Normalized module identifier in `owner-name` form
///
/// Case-sensitive; two ids differing only in case are distinct modules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId {
    owner: String,
    name: String,
}

impl ModuleId {
    /// Parses an id from either `owner/name` or `owner-name`
    ///
    /// Owner and name each must be non-empty; the owner is alphanumeric and
    /// the name is lowercase alphanumeric with underscores. The separator in
    /// the dash form is the first `-` in the string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .or_else(|| trimmed.split_once('-'))
            .ok_or_else(|| ParseError::module_id(trimmed, "missing owner-name separator"))?;

        if !OWNER_RE.is_match(owner) {
            return Err(ParseError::module_id(trimmed, "invalid owner segment"));
        }
        if !NAME_RE.is_match(name) {
            return Err(ParseError::module_id(trimmed, "invalid name segment"));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// The owner segment (`puppetlabs` in `puppetlabs-stdlib`)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The short name segment (`stdlib` in `puppetlabs-stdlib`)
    ///
    /// Also the name of the directory the module is installed under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `owner-name` slug used in Forge URLs and display
    pub fn slug(&self) -> String {
        format!("{}-{}", self.owner, self.name)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.owner, self.name)
    }
}

impl FromStr for ModuleId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.slug()
    }
}
