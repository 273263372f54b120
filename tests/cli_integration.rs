//! CLI integration tests
//!
//! These tests verify the command-line interface behavior, including:
//! - Command parsing and validation
//! - Output formatting
//! - Error handling
//! - Exit codes

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the modlink binary
fn modlink_bin() -> PathBuf {
    // In tests, the binary should be at target/debug/modlink
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // If we're in deps/, go up one more level
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("modlink")
}

/// Helper to create a project with one linkable android module
fn create_project(dir: &TempDir) -> PathBuf {
    let root = dir.path().to_path_buf();
    fs::write(
        root.join("package.json"),
        r#"{ "name": "app", "dependencies": { "camera-kit": "*" } }"#,
    )
    .expect("Failed to write project package.json");

    let package_dir = root.join("node_modules/camera-kit");
    fs::create_dir_all(&package_dir).expect("Failed to create package directory");
    fs::write(
        package_dir.join("package.json"),
        r#"{ "name": "camera-kit", "version": "3.1.0" }"#,
    )
    .expect("Failed to write package.json");
    fs::write(
        package_dir.join("module.config.json"),
        r#"{ "android": { "modules": ["dev.cam.CameraPackage"], "gradlePath": "android" } }"#,
    )
    .expect("Failed to write module.config.json");

    root
}

#[test]
fn test_cli_help() {
    let output = Command::new(modlink_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute modlink");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("modlink"));
    assert!(stdout.contains("resolve"));
    assert!(stdout.contains("generate"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(modlink_bin())
        .arg("--version")
        .output()
        .expect("Failed to execute modlink");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("modlink"));
}

#[test]
fn test_resolve_json_output() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let root = create_project(&tmp);

    let output = Command::new(modlink_bin())
        .arg("resolve")
        .arg(root.join("node_modules"))
        .args(["--platform", "android", "--json", "--silent"])
        .args(["--project-root"])
        .arg(&root)
        .output()
        .expect("Failed to execute modlink");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid JSON");
    assert_eq!(parsed["camera-kit"]["version"], "3.1.0");
}

#[test]
fn test_generate_android_descriptors() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let root = create_project(&tmp);

    let output = Command::new(modlink_bin())
        .arg("generate")
        .arg(root.join("node_modules"))
        .args(["--platform", "android", "--silent"])
        .args(["--project-root"])
        .arg(&root)
        .output()
        .expect("Failed to execute modlink");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid JSON");
    assert_eq!(parsed[0]["packageName"], "camera-kit");
    assert_eq!(parsed[0]["modules"][0], "dev.cam.CameraPackage");
}

#[test]
fn test_generate_writes_output_file() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let root = create_project(&tmp);
    let out_file = root.join("descriptors.json");

    let output = Command::new(modlink_bin())
        .arg("generate")
        .arg(root.join("node_modules"))
        .args(["--platform", "android", "--silent"])
        .args(["--project-root"])
        .arg(&root)
        .args(["--output"])
        .arg(&out_file)
        .output()
        .expect("Failed to execute modlink");

    assert!(output.status.success());
    let content = fs::read_to_string(&out_file).expect("output file written");
    assert!(content.contains("camera-kit"));
}

#[test]
fn test_missing_search_path_argument_fails_parsing() {
    let output = Command::new(modlink_bin())
        .args(["resolve", "--platform", "android"])
        .output()
        .expect("Failed to execute modlink");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SEARCH_PATH"));
}

#[test]
fn test_unusable_project_root_exits_nonzero() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let root = create_project(&tmp);

    let output = Command::new(modlink_bin())
        .arg("resolve")
        .arg(root.join("node_modules"))
        .args(["--platform", "android"])
        .args(["--project-root"])
        .arg(root.join("does-not-exist"))
        .output()
        .expect("Failed to execute modlink");

    assert_eq!(output.status.code(), Some(1));
}
