//! Plan application
//!
//! Walks a successful plan and swaps each upgrading module's directory for
//! the content of its released tarball. Nodes apply children first, so an
//! apply that dies partway leaves every already-moved dependency in place
//! for the next attempt. `no-change` nodes are never touched.
//!
//! Forge tarballs hold a single top-level directory named after the release;
//! anything else is rejected before the old module directory is removed.

use crate::catalog::ForgeCatalog;
use crate::error::{CatalogError, InstallError};
use crate::events::EventSink;
use crate::graph::InstalledGraph;
use crate::plan::{PlanAction, PlanNode};
use crate::progress::Progress;
use flate2::read::GzDecoder;
use std::fs;
use std::path::{Path, PathBuf};
use tar::Archive;

/// Applies plan trees to the module tree on disk
pub struct Installer<'a> {
    graph: &'a InstalledGraph,
    forge: &'a ForgeCatalog,
    events: &'a dyn EventSink,
}

impl<'a> Installer<'a> {
    pub fn new(
        graph: &'a InstalledGraph,
        forge: &'a ForgeCatalog,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            graph,
            forge,
            events,
        }
    }

    /// Applies every upgrade node in the tree, children before parents
    pub async fn apply(&self, root: &PlanNode, progress: &mut Progress) -> Result<(), InstallError> {
        let mut ordered = Vec::new();
        collect_post_order(root, &mut ordered);
        ordered.retain(|node| node.action == PlanAction::Upgrade);

        progress.start(ordered.len() as u64, "Downloading from the Forge");
        for node in ordered {
            progress.set_message(&format!("{} ({})", node.id, node.new_version));
            self.apply_node(node).await?;
            progress.inc();
        }
        progress.finish_and_clear();

        Ok(())
    }

    async fn apply_node(&self, node: &PlanNode) -> Result<(), InstallError> {
        self.events.debug(&format!(
            "fetching release {} {}",
            node.id, node.new_version
        ));

        let release = self
            .forge
            .release(&node.id, &node.new_version)
            .await
            .map_err(|error| match error {
                CatalogError::ModuleNotFound { .. } => InstallError::release_not_found(
                    node.id.to_string(),
                    node.new_version.to_string(),
                ),
                other => InstallError::download_error(
                    node.id.to_string(),
                    node.new_version.to_string(),
                    other.to_string(),
                ),
            })?;

        let bytes = self
            .forge
            .download(&node.id, &release)
            .await
            .map_err(|error| {
                InstallError::download_error(
                    node.id.to_string(),
                    node.new_version.to_string(),
                    error.to_string(),
                )
            })?;

        self.swap_in(node, &bytes)?;

        self.events.notice(&format!(
            "Upgraded '{}' from {} to {}",
            node.id, node.previous, node.new_version
        ));
        Ok(())
    }

    /// Unpacks the tarball into a staging directory inside the install root,
    /// then replaces the old module directory with the staged tree
    fn swap_in(&self, node: &PlanNode, bytes: &[u8]) -> Result<(), InstallError> {
        let staging = node.path.join(format!(".{}.staging", node.id.slug()));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|error| InstallError::filesystem(staging.clone(), error))?;
        }
        fs::create_dir_all(&staging)
            .map_err(|error| InstallError::filesystem(staging.clone(), error))?;

        let swapped = self.unpack_and_place(node, bytes, &staging);

        // staging must not survive either outcome
        let _ = fs::remove_dir_all(&staging);
        swapped
    }

    fn unpack_and_place(
        &self,
        node: &PlanNode,
        bytes: &[u8],
        staging: &Path,
    ) -> Result<(), InstallError> {
        let mut archive = Archive::new(GzDecoder::new(bytes));
        archive
            .unpack(staging)
            .map_err(|error| InstallError::archive_error(node.id.to_string(), error.to_string()))?;

        let unpacked = single_directory(staging)
            .map_err(|message| InstallError::archive_error(node.id.to_string(), message))?;

        // The installed record knows the real old directory; a module from a
        // tree scanned under a different directory name still gets replaced
        // rather than duplicated.
        let old_dir = self
            .graph
            .get(&node.id)
            .map(|module| module.path.clone())
            .unwrap_or_else(|| node.path.join(node.id.name()));
        if old_dir.exists() {
            fs::remove_dir_all(&old_dir)
                .map_err(|error| InstallError::filesystem(old_dir.clone(), error))?;
        }

        let destination = node.path.join(node.id.name());
        fs::rename(&unpacked, &destination)
            .map_err(|error| InstallError::filesystem(destination.clone(), error))?;

        Ok(())
    }
}

fn collect_post_order<'n>(node: &'n PlanNode, out: &mut Vec<&'n PlanNode>) {
    for child in &node.children {
        collect_post_order(child, out);
    }
    out.push(node);
}

/// The single top-level directory a Forge tarball must unpack to
fn single_directory(staging: &Path) -> Result<PathBuf, String> {
    let mut entries = Vec::new();
    let listing =
        fs::read_dir(staging).map_err(|error| format!("cannot read staging dir: {}", error))?;
    for entry in listing {
        let entry = entry.map_err(|error| format!("cannot read staging dir: {}", error))?;
        entries.push(entry.path());
    }

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Err(format!(
            "expected a single top-level directory, found {} entries",
            entries.len()
        )),
    }
}
