//! Importer command line tests

use std::process::Command;

/// Test that the importer shows help
#[test]
fn test_import_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "amv-import", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Importer help should succeed");
    assert!(stdout.contains("Print importer for AM-Vision"));
    assert!(stdout.contains("<URL>"), "Should show url argument");
    assert!(stdout.contains("<TOKEN>"), "Should show token argument");
    assert!(stdout.contains("<META_FN>"), "Should show metadata argument");
    assert!(stdout.contains("--quiet"), "Should offer quiet output");
    assert!(!stdout.contains("--verbose"));
}

/// Test that the importer shows version
#[test]
fn test_import_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "amv-import", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Importer version should succeed");
    assert!(stdout.contains("amv-import"), "Should show binary name");
}

/// Test that a missing metadata file fails before any upload
#[test]
fn test_import_missing_metadata_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta_fn = dir.path().join("prints.yaml");

    let output = Command::new("cargo")
        .args(["run", "-p", "amv-import", "--", "http://127.0.0.1:9/api/", "token"])
        .arg(&meta_fn)
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing metadata should fail");
    assert!(stderr.contains("cannot load"), "Should name the failing step");
}

/// Test that import steps are logged without extra flags
#[test]
fn test_import_logs_steps_by_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta_fn = dir.path().join("prints.yaml");
    std::fs::write(
        &meta_fn,
        "material_references: []\nviews: []\nprint_attributes: []\nqueries: []\nprints: []\nbatches: []\n",
    )
    .unwrap();

    let output = Command::new("cargo")
        .args(["run", "-p", "amv-import", "--", "http://127.0.0.1:9/api/", "token"])
        .arg(&meta_fn)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    // nothing listens on port 9, so the first request fails
    assert!(!output.status.success());
    assert!(stdout.contains("Running one-time imports"), "Should log import steps");
}

/// Test that quiet mode hides the step logs
#[test]
fn test_import_quiet_hides_step_logs() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta_fn = dir.path().join("prints.yaml");
    std::fs::write(
        &meta_fn,
        "material_references: []\nviews: []\nprint_attributes: []\nqueries: []\nprints: []\nbatches: []\n",
    )
    .unwrap();

    let output = Command::new("cargo")
        .args(["run", "-p", "amv-import", "--", "--quiet", "http://127.0.0.1:9/api/", "token"])
        .arg(&meta_fn)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success());
    assert!(!stdout.contains("Running one-time imports"));
}
