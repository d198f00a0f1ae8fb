//! Version constraints on dependency edges
//!
//! Handles the requirement dialect found in module metadata:
//! - Exact: `1.2.3`
//! - Comparison: `>= 1.2.3`, `> 1.2.3`, `<= 1.2.3`, `< 1.2.3`, `= 1.2.3`
//! - Space-separated ranges: `>= 1.0.0 < 2.0.0`
//! - Wildcard: `1.x`, `1.2.x`, `*`
//! - Any: missing or empty requirement
//!
//! Inputs are normalized into a comma-separated comparator list before being
//! handed to `semver::VersionReq`; the original text is kept for display.

use crate::domain::Version;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The shape of a constraint, for diagnostics and policy checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Accepts every version
    Any,
    /// Pins a single full version
    Exact,
    /// Anything else: comparisons, compound ranges, wildcards
    Range,
}

/// A predicate over [`Version`] attached to a consumer→dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    kind: ConstraintKind,
    raw: String,
    req: semver::VersionReq,
}

impl VersionConstraint {
    /// Parses a requirement string in the metadata dialect
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let raw = input.trim().to_string();
        if raw.is_empty() || raw == "*" {
            return Ok(Self::any());
        }

        let comparators = tokenize(&raw)
            .map_err(|reason| ParseError::constraint(&raw, reason))?;
        let kind = if comparators.len() == 1 && comparators[0].starts_with('=') {
            ConstraintKind::Exact
        } else {
            ConstraintKind::Range
        };

        let normalized = comparators.join(", ");
        let req = semver::VersionReq::parse(&normalized)
            .map_err(|e| ParseError::constraint(&raw, e.to_string()))?;

        Ok(Self { kind, raw, req })
    }

    /// The constraint that accepts every version
    pub fn any() -> Self {
        Self {
            kind: ConstraintKind::Any,
            raw: ">= 0.0.0".to_string(),
            req: semver::VersionReq::STAR,
        }
    }

    /// Does `version` satisfy this constraint?
    pub fn matches(&self, version: &Version) -> bool {
        match self.kind {
            ConstraintKind::Any => true,
            _ => self.req.matches(version.semver()),
        }
    }

    /// The shape of this constraint
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// True when every version satisfies the constraint
    pub fn is_any(&self) -> bool {
        self.kind == ConstraintKind::Any
    }
}

/// Splits a requirement string into normalized semver comparators
///
/// `>= 1.0.0 < 2.0.0` → `[">=1.0.0", "<2.0.0"]`; a bare full version becomes
/// an exact comparator, a bare partial version becomes a wildcard.
fn tokenize(raw: &str) -> Result<Vec<String>, String> {
    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in raw.split_whitespace() {
        match pending_op.take() {
            Some(op) => comparators.push(format!("{}{}", op, bare_operand(token)?)),
            None => {
                let op_len = token
                    .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^'))
                    .unwrap_or(token.len());
                let (op, operand) = token.split_at(op_len);
                if op.is_empty() {
                    comparators.push(plain_comparator(operand)?);
                } else if operand.is_empty() {
                    pending_op = Some(op);
                } else {
                    comparators.push(format!("{}{}", op, bare_operand(operand)?));
                }
            }
        }
    }

    if pending_op.is_some() {
        return Err("dangling comparison operator".to_string());
    }
    if comparators.is_empty() {
        return Err("no version requirement".to_string());
    }
    Ok(comparators)
}

/// Normalizes a comparator operand: strips a `v` prefix, maps `x` to `*`
fn bare_operand(token: &str) -> Result<String, String> {
    let stripped = token.strip_prefix('v').unwrap_or(token);
    if stripped.is_empty() {
        return Err("empty version operand".to_string());
    }
    Ok(stripped.replace(['x', 'X'], "*"))
}

/// Comparator for a token with no operator
fn plain_comparator(token: &str) -> Result<String, String> {
    let operand = bare_operand(token)?;
    if operand.contains('*') {
        return Ok(operand);
    }
    match operand.matches('.').count() {
        // 1.2.3 pins exactly; 1 and 1.2 widen to their wildcard ranges
        2 => Ok(format!("={}", operand)),
        0 | 1 => Ok(format!("{}.*", operand)),
        _ => Err(format!("malformed version '{}'", token)),
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for VersionConstraint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(constraint: VersionConstraint) -> Self {
        constraint.raw
    }
}
