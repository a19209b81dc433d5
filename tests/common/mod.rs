//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// An `lca` command with a fixed author and no inherited API URL
pub fn lca() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("lca"));
    cmd.env("LCA_AUTHOR", "tester")
        .env_remove("LCA_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// A fresh project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    lca().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Create the Chair product from flags and return its ID
pub fn create_chair(tmp: &TempDir) -> String {
    let output = lca()
        .current_dir(tmp.path())
        .args([
            "product",
            "new",
            "--code",
            "P1",
            "--name",
            "Chair",
            "--description",
            "Wood chair",
            "--material",
            "Wood:Oak:2.5",
            "--process",
            "0:Machining:CNC Milling",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .find(|w| w.starts_with("PRD-"))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Every stored product file
pub fn product_files(tmp: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(tmp.path().join("products"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(".lca.yaml"))
        .collect()
}
