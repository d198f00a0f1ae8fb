//! Version catalogs
//!
//! This module provides:
//! - The `VersionCatalog` trait: ordered known versions per module id
//! - HTTP client shared foundation with retry logic
//! - The Forge v3 API adapter
//! - An in-memory adapter for tests and embedding
//!
//! A catalog answers one question: which versions of a module exist, newest
//! first. A query may suspend on network I/O; callers needing timeouts get
//! them from the HTTP client configuration, the resolver itself imposes
//! none. A failed query is an error and stays distinct from a module with no
//! versions, which is an empty list.

mod client;
mod forge;

pub use client::HttpClient;
pub use forge::{ForgeCatalog, ReleaseInfo, DEFAULT_FORGE_URL};

use crate::domain::{ModuleId, Version};
use crate::error::CatalogError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Source of known versions for modules
#[async_trait]
pub trait VersionCatalog: Send + Sync {
    /// Known versions of `id`, descending (newest first)
    async fn available_versions(&self, id: &ModuleId) -> Result<Vec<Version>, CatalogError>;
}

/// In-memory catalog backed by a fixed version table
///
/// Used by tests and by embedders that already know the version universe.
/// Tracks how often each module is queried so resolver memoization is
/// observable.
#[derive(Default)]
pub struct StaticCatalog {
    versions: HashMap<ModuleId, Vec<Version>>,
    failing: HashSet<ModuleId>,
    queries: Mutex<HashMap<ModuleId, usize>>,
}

impl StaticCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the known versions of a module, in any order
    pub fn insert(&mut self, id: ModuleId, versions: Vec<Version>) {
        let mut versions = versions;
        versions.sort_unstable_by(|a, b| b.cmp(a));
        self.versions.insert(id, versions);
    }

    /// Makes queries for `id` fail with a network error
    pub fn fail_with_network_error(&mut self, id: ModuleId) {
        self.failing.insert(id);
    }

    /// How many times `id` has been queried
    pub fn query_count(&self, id: &ModuleId) -> usize {
        self.queries
            .lock()
            .map(|q| q.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl VersionCatalog for StaticCatalog {
    async fn available_versions(&self, id: &ModuleId) -> Result<Vec<Version>, CatalogError> {
        if let Ok(mut queries) = self.queries.lock() {
            *queries.entry(id.clone()).or_insert(0) += 1;
        }
        if self.failing.contains(id) {
            return Err(CatalogError::network_error(id.slug(), "connection refused"));
        }
        Ok(self.versions.get(id).cloned().unwrap_or_default())
    }
}
