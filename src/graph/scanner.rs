//! Module tree scanner
//!
//! Walks the modulepath directories and turns each child directory carrying
//! a `metadata.json` into a snapshot record. Problems with individual
//! entries (no metadata, unreadable or malformed metadata, name mismatches)
//! are collected as notes instead of aborting the scan; only an unusable
//! modulepath entry itself is an error.

use crate::domain::{ModuleId, Version, VersionConstraint};
use crate::error::ScanError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata file name expected in every module directory
pub const METADATA_FILENAME: &str = "metadata.json";

/// Raw record for one installed module
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Identifier from the metadata `name` field
    pub id: ModuleId,
    /// Version from the metadata `version` field
    pub version: Version,
    /// Directory the module lives in
    pub path: PathBuf,
    /// Declared dependencies as (id, requirement) pairs
    pub dependencies: Vec<(ModuleId, VersionConstraint)>,
}

/// Result of scanning a modulepath
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Records in ascending path precedence (graph `build` resolves
    /// duplicates by keeping the last record, so the first modulepath entry
    /// wins overall)
    pub records: Vec<ModuleRecord>,
    /// Human-readable notes about entries the scan could not use
    pub notes: Vec<String>,
}

/// Shape of `metadata.json`
#[derive(Debug, Deserialize)]
struct MetadataFile {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: Vec<MetadataDependency>,
}

#[derive(Debug, Deserialize)]
struct MetadataDependency {
    name: String,
    #[serde(default)]
    version_requirement: Option<String>,
}

/// Scans every modulepath directory into a snapshot
///
/// Entries are visited from the lowest-precedence directory (last in
/// `modulepath`) to the highest so that the emitted record order matches the
/// contract of [`super::InstalledGraph::build`]. A missing modulepath entry
/// is noted and skipped; an entry that exists but is not a readable
/// directory is an error.
pub fn scan(modulepath: &[PathBuf]) -> Result<Snapshot, ScanError> {
    let mut snapshot = Snapshot::default();

    for dir in modulepath.iter().rev() {
        if !dir.exists() {
            snapshot
                .notes
                .push(format!("modulepath entry {} does not exist", dir.display()));
            continue;
        }
        if !dir.is_dir() {
            return Err(ScanError::not_a_directory(dir));
        }

        let mut module_dirs: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| ScanError::read_error(dir, e))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        module_dirs.sort();

        for module_dir in module_dirs {
            if let Some(record) = read_module(&module_dir, &mut snapshot.notes) {
                snapshot.records.push(record);
            }
        }
    }

    Ok(snapshot)
}

/// Reads one module directory; `None` when it yields no usable record
fn read_module(dir: &Path, notes: &mut Vec<String>) -> Option<ModuleRecord> {
    let metadata_path = dir.join(METADATA_FILENAME);
    if !metadata_path.exists() {
        notes.push(format!("{} has no {}, skipped", dir.display(), METADATA_FILENAME));
        return None;
    }

    let content = match fs::read_to_string(&metadata_path) {
        Ok(content) => content,
        Err(e) => {
            notes.push(format!("could not read {}: {}", metadata_path.display(), e));
            return None;
        }
    };

    let metadata: MetadataFile = match serde_json::from_str(&content) {
        Ok(metadata) => metadata,
        Err(e) => {
            notes.push(format!("malformed {}: {}", metadata_path.display(), e));
            return None;
        }
    };

    let id = match ModuleId::parse(&metadata.name) {
        Ok(id) => id,
        Err(e) => {
            notes.push(format!("{}: {}", metadata_path.display(), e));
            return None;
        }
    };
    let version = match Version::parse(&metadata.version) {
        Ok(version) => version,
        Err(e) => {
            notes.push(format!("{}: {}", metadata_path.display(), e));
            return None;
        }
    };

    if let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) {
        if dir_name != id.name() {
            notes.push(format!(
                "directory {} holds module '{}' (expected directory name '{}')",
                dir.display(),
                id,
                id.name()
            ));
        }
    }

    let mut dependencies = Vec::new();
    for dep in metadata.dependencies {
        let dep_id = match ModuleId::parse(&dep.name) {
            Ok(dep_id) => dep_id,
            Err(e) => {
                notes.push(format!("{} dependency dropped: {}", metadata_path.display(), e));
                continue;
            }
        };
        let constraint = match &dep.version_requirement {
            None => VersionConstraint::any(),
            Some(req) => match VersionConstraint::parse(req) {
                Ok(constraint) => constraint,
                Err(e) => {
                    // the edge survives as unconstrained so resolution can
                    // proceed; the note keeps the weakening visible
                    notes.push(format!("{}: {}", metadata_path.display(), e));
                    VersionConstraint::any()
                }
            },
        };
        dependencies.push((dep_id, constraint));
    }

    Some(ModuleRecord {
        id,
        version,
        path: dir.to_path_buf(),
        dependencies,
    })
}
