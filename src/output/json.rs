//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of upgrade results, tagged by outcome
//! - The full plan tree with per-node warnings for successes
//! - Reason tags and diagnostic text for no-ops and failures

use crate::output::OutputFormatter;
use crate::plan::{PlanAction, PlanNode, UpgradeResult};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Whether this is a dry-run
    dry_run: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
struct JsonOutput {
    /// Outcome tag: success, no_op, or failure
    result: &'static str,
    /// Whether this was a dry-run
    dry_run: bool,
    /// Base directory of the module tree (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    base_dir: Option<String>,
    /// The plan tree (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<JsonNode>,
    /// Machine-readable reason tag (no_op and failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    /// Version the module stays at (no_op only)
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    /// Human-readable diagnostic (no_op and failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// JSON representation of one plan node
#[derive(Serialize)]
struct JsonNode {
    /// Module identifier in owner-name form
    module: String,
    /// Version installed before the plan applies
    previous: String,
    /// Version after the plan applies
    version: String,
    /// Node action: upgrade or no_change
    action: &'static str,
    /// Modulepath entry holding the module
    path: String,
    /// Violated constraints recorded by force
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<JsonWarning>,
    /// Modules moving because this one did
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<JsonNode>,
}

/// JSON representation of a violated constraint
#[derive(Serialize)]
struct JsonWarning {
    /// Module declaring the violated constraint
    dependent: String,
    /// The constraint as declared
    constraint: String,
}

fn node_to_json(node: &PlanNode) -> JsonNode {
    JsonNode {
        module: node.id.to_string(),
        previous: node.previous.raw(),
        version: node.new_version.raw(),
        action: match node.action {
            PlanAction::Upgrade => "upgrade",
            PlanAction::NoChange => "no_change",
        },
        path: node.path.display().to_string(),
        warnings: node
            .warnings
            .iter()
            .map(|violation| JsonWarning {
                dependent: violation.dependent.to_string(),
                constraint: violation.constraint.to_string(),
            })
            .collect(),
        dependencies: node.children.iter().map(node_to_json).collect(),
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &UpgradeResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = match result {
            UpgradeResult::Success { base_dir, plan } => JsonOutput {
                result: "success",
                dry_run: self.dry_run,
                base_dir: Some(base_dir.display().to_string()),
                plan: Some(node_to_json(plan)),
                reason: None,
                version: None,
                message: None,
            },
            UpgradeResult::NoOp { reason, diagnostic } => JsonOutput {
                result: "no_op",
                dry_run: self.dry_run,
                base_dir: None,
                plan: None,
                reason: Some(reason.label()),
                version: Some(reason.version().raw()),
                message: Some(diagnostic.clone()),
            },
            UpgradeResult::Failure { kind, diagnostic } => JsonOutput {
                result: "failure",
                dry_run: self.dry_run,
                base_dir: None,
                plan: None,
                reason: Some(kind.label()),
                version: None,
                message: Some(diagnostic.clone()),
            },
        };

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }
}
