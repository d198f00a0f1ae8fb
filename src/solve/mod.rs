//! Constraint solver
//!
//! Decides which version a target module can move to without breaking the
//! constraints declared by the rest of the installed tree, and which other
//! installed modules must move along with it.
//!
//! The solver never touches disk or network directly: it reads one
//! [`InstalledGraph`] snapshot and queries one [`VersionCatalog`], memoizing
//! catalog answers for the duration of a solve call. Transitive work runs
//! breadth-first over declared dependency edges with one decided version per
//! module, so dependency cycles surface as conflicts instead of looping.

use crate::catalog::VersionCatalog;
use crate::domain::{ModuleId, Version, VersionConstraint};
use crate::error::CatalogError;
use crate::events::EventSink;
use crate::graph::InstalledGraph;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Policy flags steering one solve call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolvePolicy {
    /// Accept the newest (or requested) version even when installed
    /// dependents object; objections become warnings on the plan
    pub force: bool,
    /// Skip dependency checking entirely: no incoming-edge validation, no
    /// transitive moves
    pub ignore_dependencies: bool,
}

/// A dependent's constraint that the chosen version does not satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// The installed module declaring the violated constraint
    pub dependent: ModuleId,
    /// The constraint text as declared
    pub constraint: VersionConstraint,
}

/// One module the solve decided to move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleChange {
    /// The moving module
    pub id: ModuleId,
    /// Version currently installed
    pub previous: Version,
    /// Version it moves to
    pub new_version: Version,
    /// The module whose requirement forced this move
    pub required_by: ModuleId,
    /// Constraints the new version violates (force only)
    pub warnings: Vec<ConstraintViolation>,
}

/// A satisfiable assignment for the target and its collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Version chosen for the target
    pub version: Version,
    /// Constraints the chosen target version violates (force only)
    pub warnings: Vec<ConstraintViolation>,
    /// Other modules that must move, in discovery order
    pub changes: Vec<ModuleChange>,
}

/// What a solve call decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Something has to move; the resolution says what
    Upgrade(Resolution),
    /// The target is already at the chosen version and nothing else moves
    Current {
        /// The version already installed
        version: Version,
    },
}

/// Why a solve call produced no assignment
#[derive(Debug, Error)]
pub enum SolveError {
    /// The target has no installed record
    #[error("module '{module}' is not installed")]
    NotInstalled { module: ModuleId },

    /// An explicitly requested version does not exist in the catalog
    #[error("version {requested} of '{module}' does not exist on the Forge")]
    VersionNotFound {
        module: ModuleId,
        requested: Version,
        available: Vec<Version>,
    },

    /// The catalog knows no versions of the target at all
    #[error("no releases of '{module}' are available on the Forge")]
    NoVersions { module: ModuleId },

    /// No candidate version satisfies every installed dependent
    #[error("no version of '{module}' satisfies every installed dependent")]
    DependencyConflict {
        module: ModuleId,
        /// Newest candidate examined; absent when the catalog was empty
        candidate: Option<Version>,
        blocking: Vec<ConstraintViolation>,
    },

    /// A declared dependency has no installed record
    #[error("'{required_by}' requires '{module}' ({constraint}) but it is not installed")]
    MissingDependency {
        module: ModuleId,
        required_by: ModuleId,
        constraint: VersionConstraint,
    },

    /// Transitive resolution revisited an already-decided module with an
    /// incompatible requirement
    #[error("dependency cycle while resolving '{module}' (required by '{required_by}')")]
    CyclicConflict {
        module: ModuleId,
        required_by: ModuleId,
    },

    /// The catalog query itself failed; not the same as an empty catalog
    #[error("could not query the Forge for '{module}': {source}")]
    CatalogUnavailable {
        module: ModuleId,
        #[source]
        source: CatalogError,
    },
}

/// Resolves upgrade requests against one graph snapshot and one catalog
pub struct ConstraintSolver<'a> {
    graph: &'a InstalledGraph,
    catalog: &'a dyn VersionCatalog,
    events: &'a dyn EventSink,
}

impl<'a> ConstraintSolver<'a> {
    /// Creates a solver over a snapshot and a catalog
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

    /// Decides the target's new version and every transitive move
    ///
    /// `requested` pins the exact version to use; `None` means newest
    /// acceptable. The outcome covers the whole assignment; errors carry the
    /// blocking evidence.
    pub async fn solve(
        &self,
        target: &ModuleId,
        requested: Option<&Version>,
        policy: SolvePolicy,
    ) -> Result<SolveOutcome, SolveError> {
        let installed = self
            .graph
            .get(target)
            .ok_or_else(|| SolveError::NotInstalled {
                module: target.clone(),
            })?;

        // one catalog query per module per solve call
        let mut memo: HashMap<ModuleId, Vec<Version>> = HashMap::new();

        let known = self.versions(&mut memo, target).await?;
        let candidates = match requested {
            Some(version) => {
                if !known.contains(version) {
                    return Err(SolveError::VersionNotFound {
                        module: target.clone(),
                        requested: version.clone(),
                        available: known,
                    });
                }
                vec![version.clone()]
            }
            None => {
                if known.is_empty() {
                    return Err(SolveError::NoVersions {
                        module: target.clone(),
                    });
                }
                known
            }
        };

        let (chosen, warnings) = self.choose(target, &candidates, policy)?;

        let mut changes: Vec<ModuleChange> = Vec::new();
        if !policy.ignore_dependencies {
            self.resolve_dependencies(installed.id.clone(), &chosen, &mut memo, &mut changes, policy)
                .await?;
        }

        if chosen == installed.version && changes.is_empty() {
            return Ok(SolveOutcome::Current { version: chosen });
        }

        Ok(SolveOutcome::Upgrade(Resolution {
            version: chosen,
            warnings,
            changes,
        }))
    }

    /// Picks the target version the installed dependents can live with
    fn choose(
        &self,
        target: &ModuleId,
        candidates: &[Version],
        policy: SolvePolicy,
    ) -> Result<(Version, Vec<ConstraintViolation>), SolveError> {
        let newest = candidates[0].clone();

        if policy.ignore_dependencies {
            return Ok((newest, Vec::new()));
        }

        let dependents = self.graph.dependents_of(target);
        self.events.debug(&format!(
            "checking {} dependent constraint(s) on '{}'",
            dependents.len(),
            target
        ));

        if let Some(version) = candidates
            .iter()
            .find(|candidate| dependents.iter().all(|(_, c)| c.matches(candidate)))
        {
            return Ok((version.clone(), Vec::new()));
        }

        let blocking: Vec<ConstraintViolation> = dependents
            .iter()
            .filter(|(_, constraint)| !constraint.matches(&newest))
            .map(|(dependent, constraint)| ConstraintViolation {
                dependent: (*dependent).clone(),
                constraint: (*constraint).clone(),
            })
            .collect();

        if policy.force {
            self.events.debug(&format!(
                "forcing '{}' to {} past {} violated constraint(s)",
                target,
                newest,
                blocking.len()
            ));
            return Ok((newest, blocking));
        }

        Err(SolveError::DependencyConflict {
            module: target.clone(),
            candidate: Some(newest),
            blocking,
        })
    }

    /// Walks the target's outgoing edges breadth-first, moving dependencies
    /// whose installed versions no longer satisfy their constraints
    async fn resolve_dependencies(
        &self,
        target: ModuleId,
        chosen: &Version,
        memo: &mut HashMap<ModuleId, Vec<Version>>,
        changes: &mut Vec<ModuleChange>,
        policy: SolvePolicy,
    ) -> Result<(), SolveError> {
        // one decided version per module; the target's is fixed up front
        let mut decided: HashMap<ModuleId, Version> = HashMap::new();
        decided.insert(target.clone(), chosen.clone());

        let mut queue: VecDeque<(ModuleId, ModuleId, VersionConstraint)> = VecDeque::new();
        if let Some(module) = self.graph.get(&target) {
            for (dep_id, constraint) in &module.dependencies {
                queue.push_back((target.clone(), dep_id.clone(), constraint.clone()));
            }
        }

        while let Some((required_by, dep_id, constraint)) = queue.pop_front() {
            if let Some(version) = decided.get(&dep_id) {
                // a forced decision already carries the violation as a warning
                if constraint.matches(version) || policy.force {
                    continue;
                }
                return Err(SolveError::CyclicConflict {
                    module: dep_id,
                    required_by,
                });
            }

            let dep = match self.graph.get(&dep_id) {
                Some(dep) => dep,
                None => {
                    return Err(SolveError::MissingDependency {
                        module: dep_id,
                        required_by,
                        constraint,
                    });
                }
            };

            if constraint.matches(&dep.version) {
                continue;
            }

            self.events.debug(&format!(
                "'{}' at {} does not satisfy '{}' required by '{}'",
                dep_id, dep.version, constraint, required_by
            ));

            let (new_version, warnings) = self
                .replacement_for(&dep_id, &constraint, memo, policy)
                .await?;

            decided.insert(dep_id.clone(), new_version.clone());
            changes.push(ModuleChange {
                id: dep_id.clone(),
                previous: dep.version.clone(),
                new_version,
                required_by,
                warnings,
            });

            for (sub_id, sub_constraint) in &dep.dependencies {
                queue.push_back((dep_id.clone(), sub_id.clone(), sub_constraint.clone()));
            }
        }

        Ok(())
    }

    /// Finds a version a moving dependency can land on
    ///
    /// The pick must satisfy every installed dependent of the dependency
    /// (the triggering edge is one of them). Under force a partial pick is
    /// allowed and the violations come back as warnings.
    async fn replacement_for(
        &self,
        dep_id: &ModuleId,
        triggering: &VersionConstraint,
        memo: &mut HashMap<ModuleId, Vec<Version>>,
        policy: SolvePolicy,
    ) -> Result<(Version, Vec<ConstraintViolation>), SolveError> {
        let candidates = self.versions(memo, dep_id).await?;
        let incoming = self.graph.dependents_of(dep_id);

        if let Some(version) = candidates
            .iter()
            .find(|candidate| incoming.iter().all(|(_, c)| c.matches(candidate)))
        {
            return Ok((version.clone(), Vec::new()));
        }

        let violations_of = |version: &Version| -> Vec<ConstraintViolation> {
            incoming
                .iter()
                .filter(|(_, constraint)| !constraint.matches(version))
                .map(|(dependent, constraint)| ConstraintViolation {
                    dependent: (*dependent).clone(),
                    constraint: (*constraint).clone(),
                })
                .collect()
        };

        if policy.force {
            // prefer a version the triggering edge accepts, else newest
            let fallback = candidates
                .iter()
                .find(|candidate| triggering.matches(candidate))
                .or_else(|| candidates.first());
            if let Some(version) = fallback {
                return Ok((version.clone(), violations_of(version)));
            }
        }

        let all_incoming: Vec<ConstraintViolation> = incoming
            .iter()
            .map(|(dependent, constraint)| ConstraintViolation {
                dependent: (*dependent).clone(),
                constraint: (*constraint).clone(),
            })
            .collect();

        Err(SolveError::DependencyConflict {
            module: dep_id.clone(),
            candidate: candidates.first().cloned(),
            blocking: match candidates.first() {
                Some(newest) => violations_of(newest),
                None => all_incoming,
            },
        })
    }

    /// Memoized catalog lookup
    ///
    /// A module the Forge has never heard of resolves to an empty list; only
    /// a failed query is an error.
    async fn versions(
        &self,
        memo: &mut HashMap<ModuleId, Vec<Version>>,
        id: &ModuleId,
    ) -> Result<Vec<Version>, SolveError> {
        if let Some(cached) = memo.get(id) {
            return Ok(cached.clone());
        }

        let versions = match self.catalog.available_versions(id).await {
            Ok(versions) => versions,
            Err(CatalogError::ModuleNotFound { .. }) => {
                self.events
                    .debug(&format!("'{}' is unknown to the Forge", id));
                Vec::new()
            }
            Err(source) => {
                return Err(SolveError::CatalogUnavailable {
                    module: id.clone(),
                    source,
                });
            }
        };

        memo.insert(id.clone(), versions.clone());
        Ok(versions)
    }
}
