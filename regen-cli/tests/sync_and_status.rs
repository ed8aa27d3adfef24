#![cfg(unix)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ECHO_SCRIPT: &str = r#"mkdir -p "$2" && cp "$1" "$2/echo.json""#;

fn regen() -> Command {
    Command::cargo_bin("regen").expect("regen binary")
}

fn write_spec(dir: &Path) -> std::path::PathBuf {
    let spec = dir.join("api.json");
    fs::write(&spec, r#"{"openapi": "3.0.0", "paths": {}}"#).unwrap();
    spec
}

fn sync_args(spec: &Path, out: &Path) -> Vec<String> {
    vec![
        "sync".to_string(),
        spec.display().to_string(),
        out.display().to_string(),
        "--generator".to_string(),
        "sh".to_string(),
        "--generator-arg".to_string(),
        "-c".to_string(),
        "--generator-arg".to_string(),
        ECHO_SCRIPT.to_string(),
        "--generator-arg".to_string(),
        "sh".to_string(),
        "--generator-arg".to_string(),
        "{input}".to_string(),
        "--generator-arg".to_string(),
        "{output}".to_string(),
    ]
}

#[test]
fn sync_writes_generated_files() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    regen()
        .args(sync_args(&spec, &out))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 written"))
        .stdout(predicate::str::contains("✎  echo.json"));

    assert!(out.join("echo.json").exists());
    assert!(out.join(".regen-manifest.json").exists());
}

#[test]
fn second_sync_is_a_noop() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    regen().args(sync_args(&spec, &out)).assert().success();
    regen()
        .args(sync_args(&spec, &out))
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));
}

#[test]
fn dry_run_previews_and_writes_nothing() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    let mut args = sync_args(&spec, &out);
    args.push("--dry-run".to_string());

    regen()
        .args(&args)
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run]"))
        .stdout(predicate::str::contains("✎  echo.json"));

    assert!(!out.exists(), "dry run must not create the output dir");
}

#[test]
fn dry_run_diff_prints_unified_diffs() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    let mut args = sync_args(&spec, &out);
    args.push("--dry-run".to_string());
    args.push("--diff".to_string());

    regen()
        .args(&args)
        .assert()
        .success()
        .stdout(predicate::str::contains("+++ b/echo.json"))
        .stdout(predicate::str::contains("@@"));
}

#[test]
fn diff_requires_dry_run() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    let mut args = sync_args(&spec, &out);
    args.push("--diff".to_string());

    regen().args(&args).assert().failure();
}

#[test]
fn failing_generator_surfaces_diagnostics() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    regen()
        .args([
            "sync",
            &spec.display().to_string(),
            &out.display().to_string(),
            "--generator",
            "sh",
            "--generator-arg",
            "-c",
            "--generator-arg",
            "echo 'unsupported schema' >&2; exit 4",
            "--generator-arg",
            "sh",
            "--generator-arg",
            "{input}",
            "--generator-arg",
            "{output}",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported schema"));
}

#[test]
fn status_reports_never_synced() {
    let workspace = TempDir::new().unwrap();
    let out = workspace.path().join("generated");

    regen()
        .args(["status", &out.display().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("never synced"));
}

#[test]
fn status_lists_manifest_contents_after_sync() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");
    regen().args(sync_args(&spec, &out)).assert().success();

    regen()
        .args(["status", &out.display().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 files"))
        .stdout(predicate::str::contains("echo.json"));
}

#[test]
fn status_json_is_machine_readable() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");
    regen().args(sync_args(&spec, &out)).assert().success();

    let output = regen()
        .args(["status", &out.display().to_string(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["synced"], serde_json::json!(true));
    assert!(payload["files"]["echo.json"].is_string());
    assert!(payload["spec_hash"].is_string());
}

#[test]
fn invalid_ignore_pattern_is_rejected() {
    let workspace = TempDir::new().unwrap();
    let spec = write_spec(workspace.path());
    let out = workspace.path().join("generated");

    let mut args = sync_args(&spec, &out);
    args.push("--ignore-pattern".to_string());
    args.push("(unclosed".to_string());

    regen()
        .args(&args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --ignore-pattern"));
}
