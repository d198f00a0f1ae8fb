//! Upgrade planning
//!
//! This module provides:
//! - UpgradeRequest: what the user asked for, normalized
//! - PlanNode / UpgradeResult: the outcome tree handed to rendering and
//!   installation
//! - UpgradePlanner: drives the solver and shapes its outcome
//!
//! Every failure becomes data in the `Failure` variant with a multi-line
//! diagnostic already composed; callers render it, they never re-derive it.
//! NoOp and Failure short-circuit before any filesystem mutation.

use crate::catalog::VersionCatalog;
use crate::domain::{ModuleId, Version};
use crate::events::EventSink;
use crate::graph::{InstalledGraph, InstalledModule};
use crate::solve::{
    ConstraintSolver, ConstraintViolation, ModuleChange, Resolution, SolveError, SolveOutcome,
    SolvePolicy,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// One upgrade invocation, normalized from the CLI
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    /// Module to upgrade
    pub target: ModuleId,
    /// Exact version to move to; `None` means newest acceptable
    pub version: Option<Version>,
    /// Override dependent constraints, recording violations as warnings
    pub force: bool,
    /// Skip dependency checking and transitive moves entirely
    pub ignore_dependencies: bool,
    /// First modulepath entry; anchor for path display and new installs
    pub base_dir: PathBuf,
}

/// What happens to one module in the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// The module moves to `new_version`
    Upgrade,
    /// The module stays put; only present for a root whose dependencies move
    NoChange,
}

/// One module in the plan tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    pub id: ModuleId,
    /// Version installed before the plan applies
    pub previous: Version,
    /// Version after the plan applies (equal to `previous` for no-change)
    pub new_version: Version,
    pub action: PlanAction,
    /// Modulepath entry holding this module
    pub path: PathBuf,
    /// Constraints the new version violates (force only)
    pub warnings: Vec<ConstraintViolation>,
    /// Modules moving because this one did, in discovery order
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Number of nodes in this subtree that actually change version
    pub fn upgrade_count(&self) -> usize {
        let own = usize::from(self.action == PlanAction::Upgrade);
        own + self
            .children
            .iter()
            .map(PlanNode::upgrade_count)
            .sum::<usize>()
    }
}

/// Why nothing needed to happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// Already at the newest version the installed modules accept
    AtLatest { version: Version },
    /// Already at the explicitly requested version
    AtRequested { version: Version },
}

impl NoOpReason {
    /// The version the module is staying at
    pub fn version(&self) -> &Version {
        match self {
            NoOpReason::AtLatest { version } | NoOpReason::AtRequested { version } => version,
        }
    }

    /// Stable tag for structured output
    pub fn label(&self) -> &'static str {
        match self {
            NoOpReason::AtLatest { .. } => "already_latest",
            NoOpReason::AtRequested { .. } => "already_requested",
        }
    }
}

/// Why the upgrade could not proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotInstalled,
    VersionNotFound,
    DependencyConflict,
    MissingDependency,
    CyclicConflict,
    CatalogUnavailable,
}

impl FailureKind {
    /// Stable tag for structured output
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::NotInstalled => "not_installed",
            FailureKind::VersionNotFound => "version_not_found",
            FailureKind::DependencyConflict => "dependency_conflict",
            FailureKind::MissingDependency => "missing_dependency",
            FailureKind::CyclicConflict => "cyclic_conflict",
            FailureKind::CatalogUnavailable => "catalog_unavailable",
        }
    }
}

/// Outcome of one upgrade invocation; exactly one variant per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeResult {
    /// Something moves; the plan says what and where
    Success { base_dir: PathBuf, plan: PlanNode },
    /// Nothing to do; the diagnostic says why
    NoOp { reason: NoOpReason, diagnostic: String },
    /// The upgrade cannot proceed; the diagnostic carries the evidence
    Failure {
        kind: FailureKind,
        diagnostic: String,
    },
}

impl UpgradeResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, UpgradeResult::Failure { .. })
    }
}

/// Turns upgrade requests into [`UpgradeResult`]s
pub struct UpgradePlanner<'a> {
    graph: &'a InstalledGraph,
    catalog: &'a dyn VersionCatalog,
    events: &'a dyn EventSink,
}

impl<'a> UpgradePlanner<'a> {
    pub fn new(
        graph: &'a InstalledGraph,
        catalog: &'a dyn VersionCatalog,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            graph,
            catalog,
            events,
        }
    }

    /// Resolves the request into a plan, a no-op, or a diagnosed failure
    pub async fn plan(&self, request: &UpgradeRequest) -> UpgradeResult {
        self.events
            .notice(&format!("Preparing to upgrade '{}' ...", request.target));

        let Some(installed) = self.graph.get(&request.target) else {
            return self.not_installed(request);
        };

        let policy = SolvePolicy {
            force: request.force,
            ignore_dependencies: request.ignore_dependencies,
        };
        let solver = ConstraintSolver::new(self.graph, self.catalog, self.events);

        match solver
            .solve(&request.target, request.version.as_ref(), policy)
            .await
        {
            Ok(SolveOutcome::Current { version }) => self.no_op(request, version),
            Ok(SolveOutcome::Upgrade(resolution)) => {
                self.events.debug(&format!(
                    "resolved '{}' to {} with {} transitive change(s)",
                    request.target,
                    resolution.version,
                    resolution.changes.len()
                ));
                UpgradeResult::Success {
                    base_dir: request.base_dir.clone(),
                    plan: self.assemble(installed, resolution),
                }
            }
            Err(error) => self.failure(request, error),
        }
    }

    /// Builds the plan tree: root = target, children nested under the module
    /// whose requirement moved them
    fn assemble(&self, installed: &InstalledModule, resolution: Resolution) -> PlanNode {
        let mut children_of: HashMap<ModuleId, Vec<PlanNode>> = HashMap::new();

        // Reverse discovery order so each node's children are complete
        // before the node itself is built; per-parent vectors come out
        // reversed and are flipped back on removal.
        for change in resolution.changes.into_iter().rev() {
            let parent = change.required_by.clone();
            let node = self.change_node(change, &mut children_of);
            children_of.entry(parent).or_default().push(node);
        }

        let mut children = children_of.remove(&installed.id).unwrap_or_default();
        children.reverse();

        let action = if resolution.version == installed.version {
            PlanAction::NoChange
        } else {
            PlanAction::Upgrade
        };

        PlanNode {
            id: installed.id.clone(),
            previous: installed.version.clone(),
            new_version: resolution.version,
            action,
            path: installed.install_root().to_path_buf(),
            warnings: resolution.warnings,
            children,
        }
    }

    fn change_node(
        &self,
        change: ModuleChange,
        children_of: &mut HashMap<ModuleId, Vec<PlanNode>>,
    ) -> PlanNode {
        let mut children = children_of.remove(&change.id).unwrap_or_default();
        children.reverse();

        let path = self
            .graph
            .get(&change.id)
            .map(|module| module.install_root().to_path_buf())
            .unwrap_or_default();

        PlanNode {
            id: change.id,
            previous: change.previous,
            new_version: change.new_version,
            action: PlanAction::Upgrade,
            path,
            warnings: change.warnings,
            children,
        }
    }

    /// Headline shared by every failure diagnostic
    fn headline(&self, request: &UpgradeRequest) -> String {
        let goal = match &request.version {
            Some(version) => version.to_string(),
            None => "latest".to_string(),
        };
        match self.graph.get(&request.target) {
            Some(module) => format!(
                "Could not upgrade module '{}' ({} -> {})",
                request.target, module.version, goal
            ),
            None => format!("Could not upgrade module '{}' ({})", request.target, goal),
        }
    }

    fn not_installed(&self, request: &UpgradeRequest) -> UpgradeResult {
        let diagnostic = format!(
            "{}\n  Module '{}' is not installed\n    Use `modup install {}` to install it",
            self.headline(request),
            request.target,
            request.target
        );
        UpgradeResult::Failure {
            kind: FailureKind::NotInstalled,
            diagnostic,
        }
    }

    fn no_op(&self, request: &UpgradeRequest, version: Version) -> UpgradeResult {
        let headline = format!("'{}' ({}) is already up to date", request.target, version);
        let (reason, cause) = match &request.version {
            Some(requested) => (
                NoOpReason::AtRequested {
                    version: version.clone(),
                },
                format!(
                    "  The installed version matches the requested {}",
                    requested
                ),
            ),
            None => (
                NoOpReason::AtLatest { version },
                "  The installed version is the newest the installed modules accept".to_string(),
            ),
        };
        UpgradeResult::NoOp {
            reason,
            diagnostic: format!("{}\n{}", headline, cause),
        }
    }

    fn failure(&self, request: &UpgradeRequest, error: SolveError) -> UpgradeResult {
        let headline = self.headline(request);
        let (kind, body) = match error {
            SolveError::NotInstalled { module } => (
                FailureKind::NotInstalled,
                format!(
                    "  Module '{}' is not installed\n    Use `modup install {}` to install it",
                    module, module
                ),
            ),
            SolveError::VersionNotFound {
                module,
                requested,
                available,
            } => {
                let detail = if available.is_empty() {
                    format!("    The Forge has no releases of '{}'", module)
                } else {
                    let listed: Vec<String> =
                        available.iter().map(ToString::to_string).collect();
                    format!("    Available versions: {}", listed.join(", "))
                };
                (
                    FailureKind::VersionNotFound,
                    format!(
                        "  No release of '{}' matches {}\n{}",
                        module, requested, detail
                    ),
                )
            }
            SolveError::NoVersions { module } => (
                FailureKind::VersionNotFound,
                format!("  The Forge has no releases of '{}'", module),
            ),
            SolveError::DependencyConflict {
                module,
                candidate,
                blocking,
            } => {
                let mut lines = vec![match &candidate {
                    Some(version) => format!(
                        "  Upgrading '{}' to {} would break these installed modules:",
                        module, version
                    ),
                    None => format!(
                        "  No release of '{}' can satisfy its installed dependents:",
                        module
                    ),
                }];
                for violation in &blocking {
                    lines.push(self.violation_line(&module, violation));
                }
                lines.push("    Use `--force` to upgrade anyway".to_string());
                (FailureKind::DependencyConflict, lines.join("\n"))
            }
            SolveError::MissingDependency {
                module,
                required_by,
                constraint,
            } => (
                FailureKind::MissingDependency,
                format!(
                    "  '{}' requires '{}' ({}) but '{}' is not installed\n    Use `modup install {}` before upgrading",
                    required_by, module, constraint, module, module
                ),
            ),
            SolveError::CyclicConflict {
                module,
                required_by,
            } => (
                FailureKind::CyclicConflict,
                format!(
                    "  '{}' and '{}' are locked in a dependency cycle no version assignment satisfies",
                    module, required_by
                ),
            ),
            SolveError::CatalogUnavailable { module, source } => (
                FailureKind::CatalogUnavailable,
                format!(
                    "  Could not query the Forge for '{}'\n    {}\n    Check the Forge URL and your network connection",
                    module, source
                ),
            ),
        };
        UpgradeResult::Failure {
            kind,
            diagnostic: format!("{}\n{}", headline, body),
        }
    }

    fn violation_line(&self, module: &ModuleId, violation: &ConstraintViolation) -> String {
        match self.graph.get(&violation.dependent) {
            Some(dependent) => format!(
                "    '{}' ({}) requires '{}' ({})",
                violation.dependent, dependent.version, module, violation.constraint
            ),
            None => format!(
                "    '{}' requires '{}' ({})",
                violation.dependent, module, violation.constraint
            ),
        }
    }
}
