//! CLI tests for `check-node`.
//!
//! Spawns the binary against the local marketplace backend and verifies exit
//! codes and the written result log.

use std::fs;
use std::path::Path;
use std::process::Command;

use prober::core::types::TaskRecord;
use prober::exit_codes;
use prober::test_support::offer;

const CONFIG: &str = r#"
command = "echo probe-ok"

[limits]
start = 10.0
cpu_per_sec = 1.0
env_per_sec = 1.0
estimate = 100.0

[pacing]
idle_secs = 0
backoff_secs = 0
max_rounds = 5
"#;

fn write_fixture(dir: &Path) {
    fs::write(dir.join("check-node.toml"), CONFIG).expect("write config");
    let offers = vec![
        offer("0x01", "nodeA", 0.0, 0.0, 0.0),
        offer("0x02", "nodeB", 0.1, 0.0, 0.0),
    ];
    fs::write(
        dir.join("offers.json"),
        serde_json::to_string_pretty(&offers).expect("offers json"),
    )
    .expect("write offers");
    fs::write(dir.join("nodes.txt"), "nodeA\n\nnodeB\n").expect("write nodes");
}

#[test]
fn missing_names_file_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(temp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_check-node"))
        .current_dir(temp.path())
        .args(["-f", "missing.txt", "--offers", "offers.json"])
        .output()
        .expect("check-node");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.txt"));
}

#[test]
fn missing_offers_file_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(temp.path());

    let status = Command::new(env!("CARGO_BIN_EXE_check-node"))
        .current_dir(temp.path())
        .arg("nodeA")
        .status()
        .expect("check-node");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn invalid_override_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(temp.path());

    let status = Command::new(env!("CARGO_BIN_EXE_check-node"))
        .current_dir(temp.path())
        .args(["-t", "0", "--offers", "offers.json", "nodeA"])
        .status()
        .expect("check-node");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn whitelist_run_writes_results() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(temp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_check-node"))
        .current_dir(temp.path())
        .args([
            "-f",
            "nodes.txt",
            "-t",
            "2",
            "--offers",
            "offers.json",
            "-o",
            "results.json",
        ])
        .output()
        .expect("check-node");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Planned work on 2 nodes:"));
    assert!(stdout.contains("Not completed: 0"));

    let raw = fs::read_to_string(temp.path().join("results.json")).expect("results");
    let records: Vec<TaskRecord> = serde_json::from_str(&raw).expect("parse results");
    let mut names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["nodeA", "nodeB"]);
    assert!(records.iter().all(|r| r.result.stdout == "probe-ok\n"));
}

#[test]
fn blacklist_run_probes_other_providers() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_fixture(temp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_check-node"))
        .current_dir(temp.path())
        .args(["-b", "1", "--offers", "offers.json", "nodeA"])
        .output()
        .expect("check-node");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Checked              : 1"));
    assert!(stdout.contains("\"name\": \"nodeB\""));
}
