//! Common test utilities shared across integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path of the grommet binary built for this test run
pub fn grommet_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_grommet"))
}

/// YAML configuration with near-instant storage simulation
pub const FAST_CONFIG: &str = "\
storage:
  presign-latency-ms: 0
  tick-interval-ms: 5
  base-transfer-ms: 20
  max-transfer-ms: 50
  seed: 3
";

/// Write [`FAST_CONFIG`] into `dir` and return its path
pub fn write_fast_config(dir: &Path) -> PathBuf {
    let path = dir.join("grommet.yaml");
    std::fs::write(&path, FAST_CONFIG).expect("Failed to write config");
    path
}

/// Run the grommet binary in the specified directory
pub fn run_grommet_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(grommet_binary())
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute grommet binary")
}

/// Parse stdout of a successful run as JSON
pub fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "grommet failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}
