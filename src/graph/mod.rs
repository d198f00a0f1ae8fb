//! Installed module graph
//!
//! This module provides:
//! - InstalledModule: one installed module with its declared dependency edges
//! - InstalledGraph: the snapshot of a module tree, queryable in both edge
//!   directions
//! - Scanner for building snapshot records from modulepath directories
//!
//! The graph is read-only after construction. Resolution records proposed
//! changes in the plan, never back into the graph, so one snapshot can serve
//! repeated planning calls. Iteration over modules and over each module's
//! dependency edges is in ascending [`ModuleId`] order, which is what makes
//! plan output reproducible.

mod scanner;

pub use scanner::{scan, ModuleRecord, Snapshot};

use crate::domain::{ModuleId, Version, VersionConstraint};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One installed module and its declared dependencies
#[derive(Debug, Clone)]
pub struct InstalledModule {
    /// Normalized identifier
    pub id: ModuleId,
    /// Version currently on disk
    pub version: Version,
    /// Directory the module is installed in
    pub path: PathBuf,
    /// Outgoing dependency edges, keyed by dependency id
    pub dependencies: BTreeMap<ModuleId, VersionConstraint>,
}

impl InstalledModule {
    /// The modulepath entry containing this module
    pub fn install_root(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// A dependency edge whose target module is not installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEdge {
    /// The installed module declaring the dependency
    pub dependent: ModuleId,
    /// The absent dependency
    pub missing: ModuleId,
    /// The declared requirement on the absent module
    pub constraint: VersionConstraint,
}

/// Snapshot of every installed module and the edges between them
#[derive(Debug, Default)]
pub struct InstalledGraph {
    modules: BTreeMap<ModuleId, InstalledModule>,
    shadowed: Vec<InstalledModule>,
}

impl InstalledGraph {
    /// Builds the graph from snapshot records
    ///
    /// Records must arrive in ascending path precedence: when one id is
    /// installed at several paths, the last record wins and the earlier ones
    /// are kept as shadowed for diagnostics. Edges referencing ids with no
    /// record stay in place; [`InstalledGraph::missing_dependencies`] lists
    /// them.
    pub fn build(records: Vec<ModuleRecord>) -> Self {
        let mut modules: BTreeMap<ModuleId, InstalledModule> = BTreeMap::new();
        let mut shadowed = Vec::new();

        for record in records {
            let module = InstalledModule {
                id: record.id,
                version: record.version,
                path: record.path,
                dependencies: record.dependencies.into_iter().collect(),
            };
            if let Some(previous) = modules.insert(module.id.clone(), module) {
                shadowed.push(previous);
            }
        }

        Self { modules, shadowed }
    }

    /// Looks up a module by id
    pub fn get(&self, id: &ModuleId) -> Option<&InstalledModule> {
        self.modules.get(id)
    }

    /// True if a module with this id is installed
    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    /// Number of installed modules (shadowed duplicates excluded)
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True if the tree holds no modules
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterates installed modules in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &InstalledModule> {
        self.modules.values()
    }

    /// Installed modules declaring a dependency on `id`, with the constraint
    /// each one declares, in ascending dependent id order
    pub fn dependents_of(&self, id: &ModuleId) -> Vec<(&ModuleId, &VersionConstraint)> {
        self.modules
            .values()
            .filter_map(|module| {
                module
                    .dependencies
                    .get(id)
                    .map(|constraint| (&module.id, constraint))
            })
            .collect()
    }

    /// Dependency edges pointing at modules that are not installed
    pub fn missing_dependencies(&self) -> Vec<MissingEdge> {
        let mut missing = Vec::new();
        for module in self.modules.values() {
            for (dep_id, constraint) in &module.dependencies {
                if !self.modules.contains_key(dep_id) {
                    missing.push(MissingEdge {
                        dependent: module.id.clone(),
                        missing: dep_id.clone(),
                        constraint: constraint.clone(),
                    });
                }
            }
        }
        missing
    }

    /// Duplicate installs displaced by higher-precedence paths
    pub fn shadowed(&self) -> &[InstalledModule] {
        &self.shadowed
    }
}
