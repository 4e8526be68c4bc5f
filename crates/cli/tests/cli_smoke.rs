//! CLI smoke tests for keel.
//!
//! These tests verify that all CLI commands run without panicking and
//! return appropriate exit codes. Only the clean step touches the
//! file system, and nothing here needs dotnet or a signing certificate.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Get a Command for the keel binary, isolated from the caller's environment.
fn keel_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("keel");
  cmd.env_remove("RUST_LOG").env_remove("KEEL_SIGNING_PASSWORD");
  cmd
}

/// Create a temp directory with a keel.toml.
fn temp_config(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("keel.toml"), content).unwrap();
  temp
}

const MINIMAL_CONFIG: &str = r#"
version = "1.2.3"
"#;

const FAILING_TOOLS_CONFIG: &str = r#"
version = "1.2.3"

[tools]
dotnet = "false"
"#;

const DEFAULT_PLAN: [&str; 10] = [
  "clean",
  "restore",
  "compile",
  "test",
  "merge",
  "pack-merged",
  "verify-package",
  "pack-standalone",
  "publish-local",
  "default",
];

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  keel_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  keel_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("keel"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["run", "plan", "list", "graph"] {
    keel_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Inspection
// =============================================================================

#[test]
fn plan_default_lists_targets_in_order() {
  let temp = temp_config(MINIMAL_CONFIG);

  let output = keel_cmd()
    .current_dir(temp.path())
    .args(["plan", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["target"], "default");
  assert_eq!(json["plan"], serde_json::json!(DEFAULT_PLAN));
}

#[test]
fn plan_text_marks_conditional_targets() {
  let temp = temp_config(MINIMAL_CONFIG);

  keel_cmd()
    .current_dir(temp.path())
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("1. clean"))
    .stdout(predicate::str::contains("publish-local (conditional)"));
}

#[test]
fn plan_unknown_target_fails() {
  let temp = temp_config(MINIMAL_CONFIG);

  keel_cmd()
    .current_dir(temp.path())
    .args(["plan", "deploy"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("target not found: deploy"));
}

#[test]
fn list_shows_all_targets() {
  let temp = temp_config(MINIMAL_CONFIG);

  let output = keel_cmd()
    .current_dir(temp.path())
    .args(["list", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let items = json.as_array().unwrap();
  assert_eq!(items.len(), 10);

  let publish = items.iter().find(|t| t["name"] == "publish-local").unwrap();
  assert_eq!(publish["conditional"], true);
  assert_eq!(publish["depends_on"], serde_json::json!(["verify-package", "pack-standalone"]));

  assert_eq!(publish["required_by"], serde_json::json!(["default"]));

  let compile = items.iter().find(|t| t["name"] == "compile").unwrap();
  assert_eq!(compile["required_by"], serde_json::json!(["test", "pack-standalone"]));

  let default = items.iter().find(|t| t["name"] == "default").unwrap();
  assert_eq!(default["aggregate"], true);
  assert_eq!(default["conditional"], false);
}

#[test]
fn graph_prints_dot() {
  let temp = temp_config(MINIMAL_CONFIG);

  keel_cmd()
    .current_dir(temp.path())
    .arg("graph")
    .assert()
    .success()
    .stdout(predicate::str::starts_with("digraph"))
    .stdout(predicate::str::contains("label = \"publish-local\""));
}

#[test]
fn missing_explicit_config_fails() {
  let temp = TempDir::new().unwrap();

  keel_cmd()
    .current_dir(temp.path())
    .args(["--config", "nope.toml", "plan"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn invalid_config_fails() {
  let temp = temp_config("version = [");

  keel_cmd()
    .current_dir(temp.path())
    .arg("list")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to parse config"));
}

// =============================================================================
// Run
// =============================================================================

#[test]
#[serial]
fn run_clean_creates_output_directories() {
  let temp = temp_config(MINIMAL_CONFIG);
  std::fs::create_dir_all(temp.path().join("artifacts")).unwrap();
  std::fs::write(temp.path().join("artifacts/stale.nupkg"), "x").unwrap();

  keel_cmd()
    .current_dir(temp.path())
    .args(["run", "clean"])
    .assert()
    .success()
    .stdout(predicate::str::contains("clean"))
    .stdout(predicate::str::contains("Build succeeded"));

  assert!(temp.path().join("publish").is_dir());
  assert!(!temp.path().join("artifacts/stale.nupkg").exists());
}

#[test]
#[serial]
fn run_json_reports_targets() {
  let temp = temp_config(MINIMAL_CONFIG);

  let output = keel_cmd()
    .current_dir(temp.path())
    .args(["run", "clean", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["success"], true);
  assert_eq!(json["version"], "1.2.3");
  assert_eq!(json["targets"][0]["name"], "clean");
  assert_eq!(json["targets"][0]["status"], "succeeded");
  assert!(json["target_duration_ms"].is_u64());
}

#[cfg(unix)]
#[test]
#[serial]
fn run_failing_tool_fails_with_target_name() {
  let temp = temp_config(FAILING_TOOLS_CONFIG);

  keel_cmd()
    .current_dir(temp.path())
    .args(["run", "compile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("target 'restore' failed"));
}

#[cfg(unix)]
#[test]
#[serial]
fn run_failure_json_lists_not_run_targets() {
  let temp = temp_config(FAILING_TOOLS_CONFIG);

  let output = keel_cmd()
    .current_dir(temp.path())
    .args(["run", "compile", "-o", "json"])
    .output()
    .unwrap();

  assert!(!output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["success"], false);
  assert_eq!(json["targets"][1]["status"], "failed");
  assert_eq!(json["not_run"], serde_json::json!(["compile"]));
}

#[test]
#[serial]
fn ci_flag_disables_local_build() {
  let temp = temp_config(MINIMAL_CONFIG);

  let output = keel_cmd()
    .current_dir(temp.path())
    .env_remove("CI")
    .args(["--ci", "run", "clean", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["local_build"], false);
}

#[test]
#[serial]
fn local_build_is_default_outside_ci() {
  let temp = temp_config(MINIMAL_CONFIG);

  let output = keel_cmd()
    .current_dir(temp.path())
    .env_remove("CI")
    .args(["run", "clean", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["local_build"], true);
}
