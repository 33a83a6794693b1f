//! Integration tests for the grommet CLI.
//!
//! These tests run the built binary. Every invocation starts a fresh
//! in-memory tracker, so multi-step flows go through `--script`.

use rstest::{fixture, rstest};
use tempfile::TempDir;

mod common;
use common::{run_grommet_in_dir, stdout_json, write_fast_config};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a fresh temporary directory for each test
#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[rstest]
fn test_cli_help(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("grommet"));
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("attach"));
}

#[rstest]
fn test_cli_version(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// One-shot Commands
// ============================================================================

#[rstest]
fn test_list_json_shows_sample_issues(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["list", "--json"]);

    let issues = stdout_json(&output);
    let titles: Vec<&str> = issues
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 3);
    assert!(titles[0].contains("API"));
    assert!(titles[1].contains("Login"));
}

#[rstest]
fn test_stats_text(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["stats"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Issue Statistics"));
    assert!(stdout.contains("Total:        3"));
}

#[rstest]
fn test_no_sample_data_starts_empty(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["--no-sample-data", "--json", "stats"]);

    let stats = stdout_json(&output);
    assert_eq!(stats["total"], 0);
}

#[rstest]
fn test_show_missing_issue_fails(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["show", "issue_missing"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Issue not found"));
}

#[rstest]
fn test_invalid_config_is_rejected(temp_dir: TempDir) {
    let config = temp_dir.path().join("bad.yaml");
    std::fs::write(&config, "storage:\n  tick-interval-ms: 0\n").unwrap();

    let output = run_grommet_in_dir(
        temp_dir.path(),
        &["--config", config.to_str().unwrap(), "stats"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tick-interval-ms"));
}

#[rstest]
fn test_search_one_shot(temp_dir: TempDir) {
    let output = run_grommet_in_dir(temp_dir.path(), &["--json", "list", "--search", "login"]);

    let issues = stdout_json(&output);
    assert_eq!(issues.as_array().unwrap().len(), 1);
    assert_eq!(issues[0]["priority"], "high");
}

// ============================================================================
// Scripts
// ============================================================================

#[rstest]
fn test_script_json_documents(temp_dir: TempDir) {
    let dir = temp_dir.path();
    let config = write_fast_config(dir);
    std::fs::write(
        dir.join("session.grommet"),
        "create \"Crash on startup\" -p urgent\nlist\n",
    )
    .unwrap();

    let output = run_grommet_in_dir(
        dir,
        &[
            "--config",
            config.to_str().unwrap(),
            "--no-sample-data",
            "--json",
            "--script",
            "session.grommet",
        ],
    );
    assert!(
        output.status.success(),
        "script failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Each command prints one JSON document.
    let stdout = String::from_utf8(output.stdout).unwrap();
    let documents: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&stdout)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["priority"], "urgent");
    assert_eq!(documents[1][0]["id"], documents[0]["id"]);
}

#[rstest]
fn test_script_shares_one_tracker(temp_dir: TempDir) {
    let dir = temp_dir.path();
    let config = write_fast_config(dir);
    std::fs::write(
        dir.join("flow.grommet"),
        "# comments and blank lines are skipped\n\ncreate \"Diagram needed\"\nlist --search diagram\nstats\n",
    )
    .unwrap();

    let output = run_grommet_in_dir(
        dir,
        &["--config", config.to_str().unwrap(), "--script", "flow.grommet"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Created issue: issue_"));
    assert!(stdout.contains("Found 1 issue(s):"));
    assert!(stdout.contains("Total:        4"));
}

#[rstest]
fn test_script_with_failures_exits_nonzero(temp_dir: TempDir) {
    let dir = temp_dir.path();
    std::fs::write(dir.join("bad.grommet"), "stats\nshow issue_nope\n").unwrap();

    let output = run_grommet_in_dir(dir, &["--script", "bad.grommet"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 2 script command(s) failed"));
}

#[rstest]
fn test_session_reads_stdin(temp_dir: TempDir) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(common::grommet_binary())
        .args(["--no-sample-data"])
        .current_dir(temp_dir.path())
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn grommet");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"create \"From stdin\"\nlist\nexit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 1 issue(s):"));
    assert!(stdout.contains("From stdin"));
    assert!(!stdout.contains("grommet> "), "no prompt without a terminal");
}
