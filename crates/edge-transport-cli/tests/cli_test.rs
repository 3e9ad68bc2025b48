//! Basic CLI tests for the edge-transport command-line interface.

use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn stub_library_path() -> PathBuf {
    let name = if cfg!(target_os = "macos") {
        "libedge_transport_stub.dylib"
    } else if cfg!(windows) {
        "edge_transport_stub.dll"
    } else {
        "libedge_transport_stub.so"
    };

    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("..");
    path.push("..");
    path.push("target");
    path.push("debug");
    path.push(name);
    path
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pluggable transport libraries"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("edge-transport"));
}

#[test]
fn test_inspect_missing_library_fails() {
    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("inspect").arg("/nonexistent/libtransport.so");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_run_requires_config() {
    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("run");

    cmd.assert().failure();
}

#[test]
fn test_run_with_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("run").arg("--config").arg(dir.path().join("absent.toml"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_inspect_stub_library() {
    let path = stub_library_path();
    if !path.exists() {
        println!("Skipping test: stub library not found at {:?}", path);
        return;
    }

    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("inspect").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("get_info: yes"))
        .stdout(predicate::str::contains("edge-transport-stub"));
}

#[test]
fn test_run_stub_session() {
    let path = stub_library_path();
    if !path.exists() {
        println!("Skipping test: stub library not found at {:?}", path);
        return;
    }

    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[info]\nmode = \"fast\"").unwrap();

    let mut cmd = Command::cargo_bin("edge-transport").unwrap();
    cmd.arg("-v")
        .arg("run")
        .arg("--config")
        .arg(config.path())
        .arg("--library")
        .arg(&path)
        .arg("--send")
        .arg("hello")
        .env_remove("EDGE_TRANSPORT_LIBRARY")
        .env_remove("EDGE_TRANSPORT_DIR");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Sent 5 bytes"));
}
