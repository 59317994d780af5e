//! CLI integration tests for update-guard
//!
//! These tests build a small product workspace on disk and run the
//! validation commands against it.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the update-guard binary.
///
/// Platform variables are cleared and the global config directory points
/// into the temp dir so the host environment cannot leak in.
fn guard_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("update-guard"));
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".xdg"))
        .env("HOME", dir)
        .env_remove("UPDATE_GUARD_OS")
        .env_remove("UPDATE_GUARD_WS")
        .env_remove("UPDATE_GUARD_ARCH")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(".update-guard").join(relative);
    fs::write(path, content).unwrap();
}

/// Initialize a workspace holding an IDE product on linux
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    guard_cmd(dir.path()).arg("init").arg(dir.path()).assert().success();

    write(
        dir.path(),
        "config.toml",
        r#"
[host]
os = "linux"
ws = "gtk"
arch = "x86_64"
bootstrap_plugins = ["org.platform.boot"]
primary_feature = "com.acme.ide"
"#,
    );

    write(
        dir.path(),
        "features/product.yaml",
        r#"
- id: com.acme.ide@1.0.0
  label: Acme IDE
  includes:
    - com.acme.editor@1.0.0
- id: com.acme.editor@1.0.0
  label: Acme Editor
  plugins: [com.acme.editor.core@1.0.0]
- id: org.platform@3.0.0
  label: Platform
  plugins: [org.platform.boot@3.0.0]
"#,
    );

    write(
        dir.path(),
        "features/extras.json",
        r#"[
  {"id": "com.acme.extra@1.0.0", "label": "Extra"},
  {"id": "com.acme.tool@1.0.0", "label": "Tool",
   "imports": [{"target": "libX@1.2.0", "rule": "compatible"}]},
  {"id": "com.acme.win@1.0.0", "label": "Windows Tools", "os": "win32"}
]"#,
    );

    write(
        dir.path(),
        "configurations/current.yaml",
        r#"
label: current
timeline: 2024-01-01T00:00:00Z
sites:
  - url: file:/opt/acme/
    configured:
      - com.acme.ide@1.0.0
      - com.acme.editor@1.0.0
      - org.platform@3.0.0
    features:
      - com.acme.extra@1.0.0
"#,
    );

    dir
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    guard_cmd(dir.path())
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized update-guard workspace"));

    assert!(dir.path().join(".update-guard/config.toml").is_file());
    assert!(dir.path().join(".update-guard/features").is_dir());
    assert!(dir.path().join(".update-guard/configurations/current.yaml").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    guard_cmd(dir.path()).arg("init").arg(dir.path()).assert().success();
    guard_cmd(dir.path()).arg("init").arg(dir.path()).assert().success();
}

#[test]
fn test_empty_workspace_misses_platform_and_primary() {
    let dir = TempDir::new().unwrap();
    guard_cmd(dir.path()).arg("init").arg(dir.path()).assert().success();

    guard_cmd(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("platform is missing"))
        .stdout(predicate::str::contains("\"org.eclipse.platform\""));
}

#[test]
fn test_init_ignores_malformed_workspace_config() {
    let dir = TempDir::new().unwrap();
    guard_cmd(dir.path()).arg("init").arg(dir.path()).assert().success();
    write(dir.path(), "config.toml", "[host\nos = ");

    let nested = dir.path().join("nested");
    guard_cmd(dir.path()).arg("init").arg(&nested).assert().success();
    assert!(nested.join(".update-guard/config.toml").is_file());

    guard_cmd(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_outside_workspace_fails() {
    let dir = TempDir::new().unwrap();

    guard_cmd(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in an update-guard workspace"));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_status_ok() {
    let dir = setup_workspace();

    guard_cmd(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::diff("OK\n"));
}

#[test]
fn test_status_json() {
    let dir = setup_workspace();

    let output = guard_cmd(dir.path())
        .args(["--format", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!({ "valid": true }));
}

#[test]
fn test_unconfigure_primary_breaks_configuration() {
    let dir = setup_workspace();

    guard_cmd(dir.path())
        .args(["unconfigure", "com.acme.ide@1.0.0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "the proposed change would break the configuration",
        ))
        .stdout(predicate::str::contains(
            "primary feature \"com.acme.ide\" is missing",
        ));
}

#[test]
fn test_configure_unrelated_feature() {
    let dir = setup_workspace();

    guard_cmd(dir.path())
        .args(["configure", "com.acme.extra@1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn test_install_with_missing_prerequisite_json() {
    let dir = setup_workspace();

    let output = guard_cmd(dir.path())
        .args(["-f", "json", "install", "com.acme.tool@1.0.0"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["diagnostic"]["root"], "change_would_break");

    let child = &json["diagnostic"]["children"][0];
    assert_eq!(child["kind"], "unsatisfied_prerequisite");
    assert_eq!(child["feature"]["id"], "com.acme.tool@1.0.0");
    assert_eq!(
        child["message"],
        "requires plug-in \"libX\", version compatible with 1.2.0"
    );
}

#[test]
fn test_platform_override_flag() {
    let dir = setup_workspace();

    guard_cmd(dir.path())
        .args(["install", "com.acme.win@1.0.0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unsupported operating system"));

    guard_cmd(dir.path())
        .args(["--os", "win32", "install", "com.acme.win@1.0.0"])
        .assert()
        .success();

    guard_cmd(dir.path())
        .env("UPDATE_GUARD_OS", "win32")
        .args(["install", "com.acme.win@1.0.0"])
        .assert()
        .success();
}

#[test]
fn test_unknown_feature_is_an_error() {
    let dir = setup_workspace();

    guard_cmd(dir.path())
        .args(["install", "com.acme.missing@1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Feature not found: com.acme.missing@1.0.0"));
}

#[test]
fn test_revert_to_other_timeline() {
    let dir = setup_workspace();
    write(
        dir.path(),
        "configurations/old.yaml",
        r#"
label: old
timeline: 2023-06-01T00:00:00Z
sites:
  - url: file:/opt/acme/
    configured: [com.acme.ide@1.0.0, com.acme.editor@1.0.0, org.platform@3.0.0]
"#,
    );

    guard_cmd(dir.path())
        .args(["revert", "old"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("different timeline"));
}

#[test]
fn test_revert_to_snapshot_on_same_timeline() {
    let dir = setup_workspace();
    write(
        dir.path(),
        "configurations/before-extra.yaml",
        r#"
label: before-extra
timeline: 2024-01-01T00:00:00Z
sites:
  - url: file:/opt/acme/
    configured: [com.acme.ide@1.0.0, com.acme.editor@1.0.0, org.platform@3.0.0]
"#,
    );

    guard_cmd(dir.path())
        .args(["revert", "before-extra"])
        .assert()
        .success();
}

#[test]
fn test_delta_enabling_unsupported_feature() {
    let dir = setup_workspace();
    let delta = dir.path().join("delta.yaml");
    fs::write(
        &delta,
        r#"
kind: enable
features:
  - site: file:/opt/acme/
    feature: com.acme.win@1.0.0
"#,
    )
    .unwrap();

    guard_cmd(dir.path())
        .arg("delta")
        .arg(&delta)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Windows Tools (1.0.0): unsupported operating system"));
}

#[test]
fn test_batch_stops_at_conflicting_step() {
    let dir = setup_workspace();
    let batch = dir.path().join("batch.yaml");
    fs::write(
        &batch,
        r#"
changes:
  - kind: configure
    feature: com.acme.extra@1.0.0
  - kind: install
    feature: com.acme.tool@1.0.0
  - kind: install
    feature: com.acme.win@1.0.0
"#,
    )
    .unwrap();

    guard_cmd(dir.path())
        .arg("batch")
        .arg(&batch)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Tool (1.0.0): conflicts with other selected updates",
        ))
        .stdout(predicate::str::contains("unsupported operating system").not());
}

// =============================================================================
// Graph Tests
// =============================================================================

#[test]
fn test_graph_lists_children_first() {
    let dir = setup_workspace();

    let output = guard_cmd(dir.path())
        .args(["graph", "com.acme.ide@1.0.0"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let editor = stdout.find("com.acme.editor@1.0.0").unwrap();
    let ide = stdout.find("com.acme.ide@1.0.0").unwrap();
    assert!(editor < ide);
}

#[test]
fn test_graph_reports_missing_includes() {
    let dir = setup_workspace();
    write(
        dir.path(),
        "features/broken.yaml",
        r#"
id: com.acme.broken@1.0.0
includes:
  - com.acme.gone@1.0.0
"#,
    );

    let output = guard_cmd(dir.path())
        .args(["--format", "json", "graph", "com.acme.broken@1.0.0"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["order"].as_array().unwrap().len(), 1);
    assert_eq!(json["missing"][0]["child"], "com.acme.gone@1.0.0");
    assert_eq!(json["missing"][0]["optional"], false);
}

#[test]
fn test_graph_text_lists_missing_includes() {
    let dir = setup_workspace();
    write(
        dir.path(),
        "features/broken.yaml",
        r#"
id: com.acme.broken@1.0.0
includes:
  - feature: com.acme.gone@1.0.0
    optional: true
"#,
    );

    guard_cmd(dir.path())
        .args(["graph", "com.acme.broken@1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "missing\tcom.acme.broken@1.0.0 -> com.acme.gone@1.0.0\toptional",
        ));
}
