//! CLI integration tests for headerpack.
//!
//! These tests drive the binary through the recipe workflow: init, package,
//! verify, publish and list.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const QFLAGS_RECIPE: &str = r#"[package]
name = "qflags"
version = "0.1"
license = "MIT"
url = "https://github.com/AlErted/qflags"
description = "Simple cross-platform C++ command-line parsing library"
exports = ["include/*"]
generators = ["cmake", "pkg_config"]

[[copy]]
pattern = "*"
src = "include"
dst = "include"
"#;

/// Get the headerpack binary command, isolated from the user's config.
fn headerpack(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("headerpack").unwrap();
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG")
        .env_remove("HEADERPACK_INDEX")
        .env_remove("HEADERPACK_MANIFEST_PATH");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write the qflags recipe and headers under `<root>/qflags`.
fn qflags_project(root: &Path) -> PathBuf {
    let dir = root.join("qflags");
    let include = dir.join("include").join("qflags");
    fs::create_dir_all(&include).unwrap();
    fs::write(dir.join("Headerpack.toml"), QFLAGS_RECIPE).unwrap();
    fs::write(include.join("qflags.h"), "#pragma once\nnamespace qflags {}\n").unwrap();
    fs::write(include.join("version.h"), "#define QFLAGS_VERSION \"0.1\"\n").unwrap();
    fs::create_dir_all(dir.join("test_package")).unwrap();
    fs::write(
        dir.join("test_package").join("example.cpp"),
        "#include <qflags/qflags.h>\nint main() { return 0; }\n",
    )
    .unwrap();
    dir
}

// ============================================================================
// headerpack init
// ============================================================================

#[test]
fn test_init_in_empty_directory() {
    let tmp = temp_dir();
    let dir = tmp.path().join("argh");
    fs::create_dir(&dir).unwrap();

    headerpack(tmp.path())
        .arg("init")
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Created"));

    let recipe = fs::read_to_string(dir.join("Headerpack.toml")).unwrap();
    assert!(recipe.contains("name = \"argh\""));
    assert!(dir.join("include/argh/argh.h").exists());
}

#[test]
fn test_init_fails_if_recipe_exists() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .args(["init", "--name", "qflags"])
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ============================================================================
// headerpack copy
// ============================================================================

#[test]
fn test_copy_tree() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .args(["copy", "include", "out/include"])
        .current_dir(&dir)
        .assert()
        .success();

    assert_eq!(
        fs::read(dir.join("include/qflags/qflags.h")).unwrap(),
        fs::read(dir.join("out/include/qflags/qflags.h")).unwrap()
    );
    assert!(dir.join("out/include/qflags/version.h").is_file());
}

#[test]
fn test_copy_rerun_drops_deleted_files() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .args(["copy", "include", "out"])
        .current_dir(&dir)
        .assert()
        .success();

    fs::remove_file(dir.join("include/qflags/version.h")).unwrap();

    headerpack(tmp.path())
        .args(["copy", "include", "out"])
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 removed"));

    assert!(dir.join("out/qflags/qflags.h").is_file());
    assert!(!dir.join("out/qflags/version.h").exists());
}

#[test]
fn test_copy_missing_source_fails_without_creating_destination() {
    let tmp = temp_dir();

    headerpack(tmp.path())
        .args(["copy", "no-such-dir", "out"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-dir"));

    assert!(!tmp.path().join("out").exists());
}

// ============================================================================
// headerpack package
// ============================================================================

#[test]
fn test_package_builds_tree_and_archive() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Packaged"));

    let pkg = dir.join(".headerpack/package");
    assert!(pkg.join("include/qflags/qflags.h").is_file());
    assert!(pkg.join("cmake/qflags-config.cmake").is_file());
    assert!(pkg.join("lib/pkgconfig/qflags.pc").is_file());
    assert!(!pkg.join("test_package").exists());
    assert!(dir.join(".headerpack/dist/qflags-0.1.tar.gz").is_file());

    let manifest = fs::read_to_string(pkg.join("headerpack.json")).unwrap();
    assert!(manifest.contains("\"license\": \"MIT\""));
}

#[test]
fn test_package_from_subdirectory_with_no_archive() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .args(["package", "--no-archive"])
        .current_dir(dir.join("include"))
        .assert()
        .success();

    assert!(dir.join(".headerpack/package/headerpack.json").is_file());
    assert!(!dir.join(".headerpack/dist").exists());
}

#[test]
fn test_package_dry_run_writes_nothing() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .args(["package", "--dry-run"])
        .current_dir(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("include/qflags/qflags.h"));

    assert!(!dir.join(".headerpack").exists());
}

#[test]
fn test_package_fails_without_recipe() {
    let tmp = temp_dir();

    headerpack(tmp.path())
        .arg("package")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Headerpack.toml"));
}

#[test]
fn test_package_rejects_uncovered_copy_source() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());
    let recipe = QFLAGS_RECIPE.replace("src = \"include\"", "src = \"src\"");
    fs::write(dir.join("Headerpack.toml"), recipe).unwrap();

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not covered by any export pattern"));
}

// ============================================================================
// headerpack info
// ============================================================================

#[test]
fn test_info_json() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    let output = headerpack(tmp.path())
        .args(["info", "--message-format", "json"])
        .current_dir(&dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["name"], "qflags");
    assert_eq!(value["version"], "0.1");
    assert_eq!(value["license"], "MIT");
    assert_eq!(value["url"], "https://github.com/AlErted/qflags");
}

#[test]
fn test_info_human() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .arg("info")
        .current_dir(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("license:     MIT"))
        .stdout(predicate::str::contains("copy:        * from include to include"));
}

// ============================================================================
// headerpack verify
// ============================================================================

#[test]
fn test_verify_detects_tampering() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .success();

    headerpack(tmp.path())
        .arg("verify")
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Verified"));

    fs::write(dir.join(".headerpack/package/include/qflags/version.h"), "tampered").unwrap();

    headerpack(tmp.path())
        .args(["verify", ".headerpack/package"])
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("modified:   include/qflags/version.h"));
}

// ============================================================================
// headerpack test
// ============================================================================

#[test]
fn test_test_requires_package() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .arg("test")
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `headerpack package` first"));
}

#[test]
fn test_test_skips_without_compiler() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());
    let empty_path = tmp.path().join("empty-path");
    fs::create_dir_all(&empty_path).unwrap();

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .success();

    headerpack(tmp.path())
        .arg("test")
        .env_remove("CXX")
        .env("PATH", &empty_path)
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("no C++ compiler found"));
}

#[cfg(unix)]
#[test]
fn test_test_reports_compile_failure() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());
    let Some(false_bin) = false_binary() else {
        return;
    };

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .success();

    headerpack(tmp.path())
        .arg("test")
        .arg("--compiler")
        .arg(&false_bin)
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("test_package compilation failed"));
}

#[cfg(unix)]
fn false_binary() -> Option<PathBuf> {
    ["/bin/false", "/usr/bin/false"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

// ============================================================================
// headerpack publish / list
// ============================================================================

#[test]
fn test_publish_and_list() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());
    let index = tmp.path().join("index");

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .success();

    headerpack(tmp.path())
        .arg("publish")
        .arg("--index")
        .arg(&index)
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Published"));

    assert!(index.join("qflags/0.1/qflags-0.1.tar.gz").is_file());

    headerpack(tmp.path())
        .arg("list")
        .arg("--index")
        .arg(&index)
        .assert()
        .success()
        .stdout(predicate::str::contains("qflags/0.1"))
        .stdout(predicate::str::contains("[MIT]"));

    headerpack(tmp.path())
        .args(["list", "qflags", "--version", "latest", "--index"])
        .arg(&index)
        .assert()
        .success()
        .stdout(predicate::str::contains("qflags/0.1"));

    headerpack(tmp.path())
        .args(["list", "qflags", "--version", "9.9", "--index"])
        .arg(&index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_json_error_event() {
    let tmp = temp_dir();

    let output = headerpack(tmp.path())
        .args(["package", "--message-format", "json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["reason"], "error");
    assert!(value["message"].as_str().unwrap().contains("Headerpack.toml"));
}

#[test]
fn test_publish_requires_package() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .args(["publish", "--index", "index"])
        .current_dir(&dir)
        .assert()
        .failure();
}

// ============================================================================
// headerpack clean
// ============================================================================

#[test]
fn test_clean_removes_outputs() {
    let tmp = temp_dir();
    let dir = qflags_project(tmp.path());

    headerpack(tmp.path())
        .arg("package")
        .current_dir(&dir)
        .assert()
        .success();

    headerpack(tmp.path())
        .arg("clean")
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!dir.join(".headerpack/package").exists());
    assert!(!dir.join(".headerpack/dist").exists());
}

#[test]
fn test_clean_help_names_removed_outputs() {
    let tmp = temp_dir();

    headerpack(tmp.path())
        .args(["clean", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Remove the staged sources, package tree and archives",
        ))
        .stdout(predicate::str::contains("work directory").not());
}

// ============================================================================
// headerpack completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    headerpack(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("headerpack"));
}
