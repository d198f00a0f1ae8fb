//! End-to-end tests for the modup CLI
//!
//! These tests verify:
//! - Exit codes for usage errors and failed upgrades
//! - Diagnostic output on stderr in text and JSON form
//! - Failed upgrades leave the module tree untouched
//!
//! Everything here stays offline; upgrade paths that would reach a real
//! Forge are covered at the library level with an in-memory catalog.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Test fixture directory creation helper
fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write a module directory with a metadata.json describing it
fn write_module(root: &Path, dir_name: &str, full_name: &str, version: &str) {
    let module_dir = root.join(dir_name);
    fs::create_dir_all(&module_dir).unwrap();
    let metadata = format!(
        r#"{{"name": "{}", "version": "{}", "dependencies": []}}"#,
        full_name, version
    );
    fs::write(module_dir.join("metadata.json"), metadata).unwrap();
}

fn modup() -> Command {
    Command::cargo_bin("modup").expect("binary should build")
}

/// Test that help lists the resolution flags
#[test]
fn test_help_lists_flags() {
    modup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--ignore-dependencies"))
        .stdout(predicate::str::contains("--modulepath"))
        .stdout(predicate::str::contains("--dry-run"));
}

/// Test that a missing module argument is a usage error
#[test]
fn test_missing_module_is_usage_error() {
    modup().assert().failure().code(2);
}

/// Test that a malformed module name is a usage error
#[test]
fn test_invalid_module_name_is_usage_error() {
    modup().arg("not a module").assert().failure().code(2);
}

/// Test that a malformed --version value is a usage error
#[test]
fn test_invalid_version_is_usage_error() {
    modup()
        .args(["acme-lib", "--version", "banana"])
        .assert()
        .failure()
        .code(2);
}

/// Test the failure path for a module that is not installed
#[test]
fn test_not_installed_fails_with_diagnostic() {
    let temp_dir = create_test_dir();
    modup()
        .arg("acme-lib")
        .arg("--modulepath")
        .arg(temp_dir.path())
        .arg("--no-color")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Could not upgrade module 'acme-lib'",
        ))
        .stderr(predicate::str::contains("is not installed"))
        .stderr(predicate::str::contains("modup install acme-lib"));
}

/// Test that the JSON formatter is wired through the binary
#[test]
fn test_not_installed_json_output() {
    let temp_dir = create_test_dir();
    modup()
        .arg("acme-lib")
        .arg("--modulepath")
        .arg(temp_dir.path())
        .arg("--format")
        .arg("json")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("\"result\": \"failure\""))
        .stderr(predicate::str::contains("\"reason\": \"not_installed\""));
}

/// Test that an unreachable Forge fails the upgrade cleanly
#[test]
fn test_unreachable_forge_fails_with_diagnostic() {
    let temp_dir = create_test_dir();
    write_module(temp_dir.path(), "lib", "acme-lib", "1.2.0");

    modup()
        .arg("acme-lib")
        .arg("--modulepath")
        .arg(temp_dir.path())
        .arg("--forge")
        .arg("http://127.0.0.1:1")
        .arg("--no-color")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Could not upgrade module 'acme-lib'",
        ))
        .stderr(predicate::str::contains("Could not query the Forge"));
}

/// Test that a failed upgrade leaves the module tree untouched
#[test]
fn test_failed_upgrade_leaves_tree_untouched() {
    let temp_dir = create_test_dir();
    write_module(temp_dir.path(), "lib", "acme-lib", "1.2.0");
    let metadata_path = temp_dir.path().join("lib").join("metadata.json");
    let before = fs::read_to_string(&metadata_path).unwrap();

    modup()
        .arg("acme-lib")
        .arg("--modulepath")
        .arg(temp_dir.path())
        .arg("--forge")
        .arg("http://127.0.0.1:1")
        .assert()
        .failure()
        .code(1);

    let after = fs::read_to_string(&metadata_path).unwrap();
    assert_eq!(before, after, "metadata should be untouched");

    let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "no staging leftovers expected");
}

/// Test that the preparing notice is suppressed in quiet mode
#[test]
fn test_quiet_suppresses_notices() {
    let temp_dir = create_test_dir();
    modup()
        .arg("acme-lib")
        .arg("--modulepath")
        .arg(temp_dir.path())
        .arg("--quiet")
        .arg("--no-color")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Preparing to upgrade").not())
        .stderr(predicate::str::contains(
            "Could not upgrade module 'acme-lib'",
        ));
}
