//! Integration tests for modup
//!
//! These tests verify:
//! - Modulepath scanning into the installed graph
//! - Upgrade resolution end to end against an in-memory catalog
//! - Plan rendering in text and JSON form

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use modup::domain::{ModuleId, Version, VersionConstraint};
use modup::graph::ModuleRecord;
use modup::plan::UpgradeRequest;

/// Test fixture directory creation helper
fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

fn mid(input: &str) -> ModuleId {
    ModuleId::parse(input).unwrap()
}

fn ver(input: &str) -> Version {
    Version::parse(input).unwrap()
}

/// Write a module directory with a metadata.json describing it
fn write_module(
    root: &Path,
    dir_name: &str,
    full_name: &str,
    version: &str,
    deps: &[(&str, &str)],
) {
    let module_dir = root.join(dir_name);
    fs::create_dir_all(&module_dir).unwrap();
    let deps_json: Vec<String> = deps
        .iter()
        .map(|(name, req)| format!(r#"{{"name": "{}", "version_requirement": "{}"}}"#, name, req))
        .collect();
    let metadata = format!(
        r#"{{"name": "{}", "version": "{}", "dependencies": [{}]}}"#,
        full_name,
        version,
        deps_json.join(", ")
    );
    fs::write(module_dir.join("metadata.json"), metadata).unwrap();
}

/// In-memory record for graphs that never touch the disk
fn record(full_name: &str, version: &str, deps: &[(&str, &str)]) -> ModuleRecord {
    let id = mid(full_name);
    let path = PathBuf::from("modules").join(id.name());
    ModuleRecord {
        version: ver(version),
        path,
        dependencies: deps
            .iter()
            .map(|(name, req)| (mid(name), VersionConstraint::parse(req).unwrap()))
            .collect(),
        id,
    }
}

fn request(target: &str) -> UpgradeRequest {
    UpgradeRequest {
        target: mid(target),
        version: None,
        force: false,
        ignore_dependencies: false,
        base_dir: PathBuf::from("modules"),
    }
}

mod scanner_and_graph {
    use super::*;
    use modup::graph::{scan, InstalledGraph};

    /// Test that a module directory with metadata becomes a graph entry
    #[test]
    fn test_scan_reads_metadata() {
        let temp_dir = create_test_dir();
        write_module(
            temp_dir.path(),
            "lib",
            "acme-lib",
            "1.2.0",
            &[("acme/core", ">= 1.0.0 < 2.0.0")],
        );

        let snapshot = scan(&[temp_dir.path().to_path_buf()]).unwrap();
        let graph = InstalledGraph::build(snapshot.records);

        let module = graph.get(&mid("acme-lib")).expect("module should be found");
        assert_eq!(module.version, ver("1.2.0"));
        assert_eq!(module.path, temp_dir.path().join("lib"));
        assert_eq!(module.dependencies.len(), 1);
        assert!(module.dependencies.contains_key(&mid("acme-core")));
    }

    /// Test that the first modulepath entry shadows later ones
    #[test]
    fn test_first_modulepath_entry_wins() {
        let site = create_test_dir();
        let modules = create_test_dir();
        write_module(site.path(), "lib", "acme-lib", "2.0.0", &[]);
        write_module(modules.path(), "lib", "acme-lib", "1.2.0", &[]);

        let snapshot = scan(&[site.path().to_path_buf(), modules.path().to_path_buf()]).unwrap();
        let graph = InstalledGraph::build(snapshot.records);

        let module = graph.get(&mid("acme-lib")).expect("module should be found");
        assert_eq!(
            module.version,
            ver("2.0.0"),
            "first modulepath entry should win"
        );
        assert_eq!(graph.shadowed().len(), 1, "the loser should be recorded");
    }

    /// Test that malformed metadata is noted and skipped, not fatal
    #[test]
    fn test_malformed_metadata_noted() {
        let temp_dir = create_test_dir();
        write_module(temp_dir.path(), "lib", "acme-lib", "1.2.0", &[]);

        let broken_dir = temp_dir.path().join("broken");
        fs::create_dir_all(&broken_dir).unwrap();
        fs::write(broken_dir.join("metadata.json"), "{ not json").unwrap();

        let snapshot = scan(&[temp_dir.path().to_path_buf()]).unwrap();
        assert!(
            snapshot.notes.iter().any(|n| n.contains("malformed")),
            "notes: {:?}",
            snapshot.notes
        );

        let graph = InstalledGraph::build(snapshot.records);
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&mid("acme-lib")));
    }

    /// Test that directories without metadata are skipped with a note
    #[test]
    fn test_children_without_metadata_skipped() {
        let temp_dir = create_test_dir();
        write_module(temp_dir.path(), "lib", "acme-lib", "1.2.0", &[]);
        fs::create_dir_all(temp_dir.path().join("scratch")).unwrap();

        let snapshot = scan(&[temp_dir.path().to_path_buf()]).unwrap();
        assert!(
            snapshot.notes.iter().any(|n| n.contains("skipped")),
            "notes: {:?}",
            snapshot.notes
        );
        assert_eq!(snapshot.records.len(), 1);
    }

    /// Test that a missing modulepath entry is noted, not an error
    #[test]
    fn test_missing_modulepath_entry_noted() {
        let temp_dir = create_test_dir();
        write_module(temp_dir.path(), "lib", "acme-lib", "1.2.0", &[]);
        let missing = temp_dir.path().join("absent");

        let snapshot = scan(&[missing, temp_dir.path().to_path_buf()]).unwrap();
        assert!(
            snapshot.notes.iter().any(|n| n.contains("does not exist")),
            "notes: {:?}",
            snapshot.notes
        );
        assert_eq!(snapshot.records.len(), 1);
    }

    /// Test that the metadata name wins over the directory name
    #[test]
    fn test_metadata_name_wins_over_directory_name() {
        let temp_dir = create_test_dir();
        write_module(temp_dir.path(), "widget", "acme-lib", "1.2.0", &[]);

        let snapshot = scan(&[temp_dir.path().to_path_buf()]).unwrap();
        assert!(
            snapshot
                .notes
                .iter()
                .any(|n| n.contains("expected directory name")),
            "notes: {:?}",
            snapshot.notes
        );

        let graph = InstalledGraph::build(snapshot.records);
        assert!(graph.contains(&mid("acme-lib")));
    }
}

mod resolution_scenarios {
    use super::*;
    use modup::catalog::StaticCatalog;
    use modup::events::NullEvents;
    use modup::graph::InstalledGraph;
    use modup::plan::{FailureKind, NoOpReason, PlanAction, UpgradePlanner, UpgradeResult};

    fn app_lib_graph(lib_version: &str) -> InstalledGraph {
        InstalledGraph::build(vec![
            record("acme-app", "1.0.0", &[("acme/lib", ">= 1.0.0 < 2.0.0")]),
            record("acme-lib", lib_version, &[]),
        ])
    }

    fn lib_catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        catalog.insert(
            mid("acme-lib"),
            vec![ver("1.2.0"), ver("1.5.0"), ver("2.0.0")],
        );
        catalog
    }

    /// Newest version inside the dependent's range is chosen
    #[tokio::test]
    async fn test_newest_allowed_version_is_chosen() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let result = planner.plan(&request("acme-lib")).await;

        match result {
            UpgradeResult::Success { plan, .. } => {
                assert_eq!(plan.id, mid("acme-lib"));
                assert_eq!(plan.previous, ver("1.2.0"));
                assert_eq!(plan.new_version, ver("1.5.0"));
                assert_eq!(plan.action, PlanAction::Upgrade);
                assert!(plan.children.is_empty());
                assert!(plan.warnings.is_empty());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    /// An explicit version outside a dependent's range is refused
    #[tokio::test]
    async fn test_pinned_version_outside_dependent_range_fails() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let mut req = request("acme-lib");
        req.version = Some(ver("2.0.0"));
        let result = planner.plan(&req).await;

        match result {
            UpgradeResult::Failure { kind, diagnostic } => {
                assert_eq!(kind, FailureKind::DependencyConflict);
                assert!(diagnostic.contains("acme-app"), "diagnostic: {}", diagnostic);
                assert!(
                    diagnostic.contains(">= 1.0.0 < 2.0.0"),
                    "diagnostic: {}",
                    diagnostic
                );
                assert!(diagnostic.contains("--force"), "diagnostic: {}", diagnostic);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    /// Force converts the refusal into a warning on the plan node
    #[tokio::test]
    async fn test_force_overrides_dependent_range_with_warning() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let mut req = request("acme-lib");
        req.version = Some(ver("2.0.0"));
        req.force = true;
        let result = planner.plan(&req).await;

        match result {
            UpgradeResult::Success { plan, .. } => {
                assert_eq!(plan.new_version, ver("2.0.0"));
                assert_eq!(plan.warnings.len(), 1);
                assert_eq!(plan.warnings[0].dependent, mid("acme-app"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    /// Already at the newest acceptable version is a no-op
    #[tokio::test]
    async fn test_already_at_newest_is_noop() {
        let graph = app_lib_graph("1.5.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let result = planner.plan(&request("acme-lib")).await;

        match result {
            UpgradeResult::NoOp {
                reason: NoOpReason::AtLatest { version },
                diagnostic,
            } => {
                assert_eq!(version, ver("1.5.0"));
                assert!(
                    diagnostic.contains("already up to date"),
                    "diagnostic: {}",
                    diagnostic
                );
            }
            other => panic!("expected no-op, got {:?}", other),
        }
    }

    /// Requesting the installed version is a no-op even when newer exists
    #[tokio::test]
    async fn test_requested_version_equal_to_installed_is_noop() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let mut req = request("acme-lib");
        req.version = Some(ver("1.2.0"));
        let result = planner.plan(&req).await;

        match result {
            UpgradeResult::NoOp {
                reason: NoOpReason::AtRequested { version },
                ..
            } => assert_eq!(version, ver("1.2.0")),
            other => panic!("expected no-op, got {:?}", other),
        }
    }

    /// A version absent from the catalog fails no matter which flags are set
    #[tokio::test]
    async fn test_unknown_version_fails_despite_flags() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let mut req = request("acme-lib");
        req.version = Some(ver("9.9.9"));
        req.force = true;
        req.ignore_dependencies = true;
        let result = planner.plan(&req).await;

        match result {
            UpgradeResult::Failure { kind, diagnostic } => {
                assert_eq!(kind, FailureKind::VersionNotFound);
                assert!(diagnostic.contains("v9.9.9"), "diagnostic: {}", diagnostic);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    /// ignore-dependencies never reports a dependency conflict
    #[tokio::test]
    async fn test_ignore_dependencies_skips_dependent_ranges() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let mut req = request("acme-lib");
        req.version = Some(ver("2.0.0"));
        req.ignore_dependencies = true;
        let result = planner.plan(&req).await;

        match result {
            UpgradeResult::Success { plan, .. } => {
                assert_eq!(plan.new_version, ver("2.0.0"));
                assert!(plan.children.is_empty());
                assert!(plan.warnings.is_empty());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    /// The same request against an unchanged graph resolves identically
    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let graph = app_lib_graph("1.2.0");
        let catalog = lib_catalog();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let first = planner.plan(&request("acme-lib")).await;
        let second = planner.plan(&request("acme-lib")).await;

        assert_eq!(first, second);
    }

    /// Scan a real tree, then repair a stale dependency while upgrading
    #[tokio::test]
    async fn test_scan_to_plan_repairs_stale_dependency() {
        let temp_dir = create_test_dir();
        write_module(
            temp_dir.path(),
            "app",
            "acme-app",
            "1.0.0",
            &[("acme/lib", ">= 2.0.0")],
        );
        write_module(temp_dir.path(), "lib", "acme-lib", "1.2.0", &[]);

        let snapshot = modup::graph::scan(&[temp_dir.path().to_path_buf()]).unwrap();
        let graph = InstalledGraph::build(snapshot.records);

        let mut catalog = StaticCatalog::new();
        catalog.insert(mid("acme-app"), vec![ver("1.0.0"), ver("1.1.0")]);
        catalog.insert(mid("acme-lib"), vec![ver("1.2.0"), ver("2.0.0")]);

        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);
        let req = UpgradeRequest {
            target: mid("acme-app"),
            version: None,
            force: false,
            ignore_dependencies: false,
            base_dir: temp_dir.path().to_path_buf(),
        };
        let result = planner.plan(&req).await;

        match result {
            UpgradeResult::Success { plan, .. } => {
                assert_eq!(plan.new_version, ver("1.1.0"));
                assert_eq!(plan.children.len(), 1);
                assert_eq!(plan.children[0].id, mid("acme-lib"));
                assert_eq!(plan.children[0].new_version, ver("2.0.0"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }
}

mod plan_rendering {
    use super::*;
    use modup::catalog::StaticCatalog;
    use modup::events::NullEvents;
    use modup::graph::InstalledGraph;
    use modup::output::{JsonFormatter, OutputFormatter, TextFormatter, Verbosity};
    use modup::plan::{UpgradePlanner, UpgradeResult};

    /// Upgrade of acme-app that drags acme-lib along with it
    async fn repair_result() -> UpgradeResult {
        let graph = InstalledGraph::build(vec![
            record("acme-app", "1.0.0", &[("acme/lib", ">= 2.0.0")]),
            record("acme-lib", "1.2.0", &[]),
        ]);
        let mut catalog = StaticCatalog::new();
        catalog.insert(mid("acme-app"), vec![ver("1.0.0"), ver("1.1.0")]);
        catalog.insert(mid("acme-lib"), vec![ver("1.2.0"), ver("2.0.0")]);

        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);
        planner.plan(&request("acme-app")).await
    }

    fn render_text(result: &UpgradeResult, dry_run: bool) -> String {
        let formatter = TextFormatter::with_color(Verbosity::Normal, dry_run, false);
        let mut buffer = Vec::new();
        formatter.format(result, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn render_json(result: &UpgradeResult, dry_run: bool) -> serde_json::Value {
        let formatter = JsonFormatter::new(dry_run);
        let mut buffer = Vec::new();
        formatter.format(result, &mut buffer).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    /// Test the text tree for an upgrade with one dragged dependency
    #[tokio::test]
    async fn test_text_tree_shows_nested_upgrade() {
        let result = repair_result().await;
        let output = render_text(&result, false);

        assert!(output.starts_with("modules\n"), "output: {}", output);
        assert!(
            output.contains("└─┬ acme-app (v1.0.0 -> v1.1.0)"),
            "output: {}",
            output
        );
        assert!(
            output.contains("  └── acme-lib (v1.2.0 -> v2.0.0)"),
            "output: {}",
            output
        );
        assert!(output.contains("2 module(s) upgraded"), "output: {}", output);
    }

    /// Test the dry-run marker on the summary line
    #[tokio::test]
    async fn test_text_dry_run_marker() {
        let result = repair_result().await;
        let output = render_text(&result, true);

        assert!(
            output.contains("(dry-run) 2 module(s) upgraded"),
            "output: {}",
            output
        );
    }

    /// Test the JSON document for a successful plan
    #[tokio::test]
    async fn test_json_success_shape() {
        let result = repair_result().await;
        let value = render_json(&result, false);

        assert_eq!(value["result"], "success");
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["base_dir"], "modules");
        assert_eq!(value["plan"]["module"], "acme-app");
        assert_eq!(value["plan"]["previous"], "1.0.0");
        assert_eq!(value["plan"]["version"], "1.1.0");
        assert_eq!(value["plan"]["action"], "upgrade");

        let deps = value["plan"]["dependencies"].as_array().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0]["module"], "acme-lib");
        assert_eq!(deps[0]["version"], "2.0.0");
    }

    /// Test the JSON document for a failure
    #[tokio::test]
    async fn test_json_failure_shape() {
        let graph = InstalledGraph::build(vec![]);
        let catalog = StaticCatalog::new();
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);
        let result = planner.plan(&request("acme-lib")).await;

        let value = render_json(&result, false);
        assert_eq!(value["result"], "failure");
        assert_eq!(value["reason"], "not_installed");
        assert!(
            value["message"]
                .as_str()
                .unwrap()
                .contains("is not installed"),
            "value: {}",
            value
        );
        assert!(value.get("plan").is_none());
    }

    /// Test the no-op diagnostic text
    #[tokio::test]
    async fn test_noop_diagnostic_text() {
        let graph = InstalledGraph::build(vec![record("acme-lib", "1.5.0", &[])]);
        let mut catalog = StaticCatalog::new();
        catalog.insert(mid("acme-lib"), vec![ver("1.5.0")]);
        let planner = UpgradePlanner::new(&graph, &catalog, &NullEvents);

        let result = planner.plan(&request("acme-lib")).await;
        let output = render_text(&result, false);

        assert!(
            output.contains("'acme-lib' (v1.5.0) is already up to date"),
            "output: {}",
            output
        );
    }
}

