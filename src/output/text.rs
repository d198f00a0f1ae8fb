//! Text output formatter for human-readable display
//!
//! This module provides:
//! - The upgrade plan tree with box-drawing connectors
//! - Install-root annotations for modules outside the base directory
//! - Constraint-violation warnings recorded by forced upgrades
//! - Pre-formatted NoOp and Failure diagnostics
//!
//! The tree mirrors what ends up on disk: the base directory on its own
//! line, then one node per module in `name (vOld -> vNew)` form. A node that
//! keeps its version shows a single version and no arrow.

use crate::domain::{ModuleId, Version};
use crate::output::{OutputFormatter, Verbosity};
use crate::plan::{PlanAction, PlanNode, UpgradeResult};
use crate::solve::ConstraintViolation;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            if self.color {
                format!("{} ", "(dry-run)".cyan())
            } else {
                "(dry-run) ".to_string()
            }
        } else {
            String::new()
        }
    }

    /// One node's text without connector or indentation
    fn node_label(&self, node: &PlanNode, base_dir: &Path) -> String {
        let versions = match node.action {
            PlanAction::Upgrade => {
                if self.color {
                    format!(
                        "({} {} {})",
                        node.previous.to_string().dimmed(),
                        "->".dimmed(),
                        node.new_version.to_string().green()
                    )
                } else {
                    format!("({} -> {})", node.previous, node.new_version)
                }
            }
            PlanAction::NoChange => format!("({})", node.new_version),
        };

        let mut label = format!("{} {}", node.id, versions);
        if node.path != base_dir {
            let root = format!(" [{}]", node.path.display());
            if self.color {
                label.push_str(&root.dimmed().to_string());
            } else {
                label.push_str(&root);
            }
        }
        label
    }

    fn write_tree(
        &self,
        node: &PlanNode,
        base_dir: &Path,
        prefix: &str,
        is_last: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let connector = match (is_last, node.children.is_empty()) {
            (true, true) => "└── ",
            (true, false) => "└─┬ ",
            (false, true) => "├── ",
            (false, false) => "├─┬ ",
        };
        writeln!(
            writer,
            "{}{}{}",
            prefix,
            connector,
            self.node_label(node, base_dir)
        )?;

        let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
        for (index, child) in node.children.iter().enumerate() {
            let last = index + 1 == node.children.len();
            self.write_tree(child, base_dir, &child_prefix, last, writer)?;
        }
        Ok(())
    }

    fn write_warnings(&self, plan: &PlanNode, writer: &mut dyn Write) -> std::io::Result<()> {
        let mut collected = Vec::new();
        collect_warnings(plan, &mut collected);
        if collected.is_empty() {
            return Ok(());
        }

        writeln!(writer)?;
        for (id, version, violation) in collected {
            let text = format!(
                "'{}' ({}) does not satisfy the requirement of '{}' ({})",
                id, version, violation.dependent, violation.constraint
            );
            if self.color {
                writeln!(writer, "{} {}", "Warning:".yellow().bold(), text)?;
            } else {
                writeln!(writer, "Warning: {}", text)?;
            }
        }
        Ok(())
    }

    fn write_success(
        &self,
        base_dir: &Path,
        plan: &PlanNode,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "{}", base_dir.display().to_string().bold())?;
        } else {
            writeln!(writer, "{}", base_dir.display())?;
        }
        self.write_tree(plan, base_dir, "", true, writer)?;
        self.write_warnings(plan, writer)?;

        if self.verbosity != Verbosity::Quiet {
            let count = plan.upgrade_count();
            writeln!(writer)?;
            if self.color {
                writeln!(
                    writer,
                    "{}{} module(s) upgraded",
                    self.dry_run_prefix(),
                    count.to_string().green()
                )?;
            } else {
                writeln!(writer, "{}{} module(s) upgraded", self.dry_run_prefix(), count)?;
            }
        }
        Ok(())
    }

    /// Diagnostics arrive pre-formatted; only the headline gets color
    fn write_diagnostic(
        &self,
        diagnostic: &str,
        failure: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for (index, line) in diagnostic.lines().enumerate() {
            if index == 0 && self.color {
                if failure {
                    writeln!(writer, "{}", line.red().bold())?;
                } else {
                    writeln!(writer, "{}", line.yellow())?;
                }
            } else {
                writeln!(writer, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &UpgradeResult, writer: &mut dyn Write) -> std::io::Result<()> {
        match result {
            UpgradeResult::Success { base_dir, plan } => {
                self.write_success(base_dir, plan, writer)
            }
            UpgradeResult::NoOp { diagnostic, .. } => {
                self.write_diagnostic(diagnostic, false, writer)
            }
            UpgradeResult::Failure { diagnostic, .. } => {
                self.write_diagnostic(diagnostic, true, writer)
            }
        }
    }
}

fn collect_warnings<'n>(
    node: &'n PlanNode,
    out: &mut Vec<(&'n ModuleId, &'n Version, &'n ConstraintViolation)>,
) {
    for violation in &node.warnings {
        out.push((&node.id, &node.new_version, violation));
    }
    for child in &node.children {
        collect_warnings(child, out);
    }
}
