use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn workspace() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let profiles = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/profiles.json");
    let config = dir.path().join("config.yaml");
    fs::write(
        &config,
        format!(
            "profiles_path: {}\ntimings:\n  member_stagger_ms: 1500\n",
            profiles.display()
        ),
    )
    .unwrap();
    let config = config.to_string_lossy().to_string();
    (dir, config)
}

fn fastfill() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("fastfill"))
}

#[test]
fn profiles_list_as_json_puts_favorites_first() {
    let (_dir, config) = workspace();
    let assert = fastfill()
        .args(["--config", &config, "--output", "json", "profiles", "list"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: Value = serde_json::from_str(&stdout).expect("json on stdout");
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["id"], "p-ravi");
    assert_eq!(entries[1]["id"], "m-family");
    assert_eq!(entries[1]["members"], 2);
    assert_eq!(entries[2]["kind"], "single");
}

#[test]
fn config_get_reads_merged_values() {
    let (_dir, config) = workspace();
    let assert = fastfill()
        .args(["--config", &config, "config", "get", "timings.member_stagger_ms"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim(), "1500");

    let assert = fastfill()
        .args(["--config", &config, "config", "get", "timings.notification_ms"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim(), "3000");
}

#[test]
fn config_validate_rejects_bad_offsets() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "timings:\n  dropdown_poll_offsets_ms: [600, 300]\n").unwrap();
    fastfill()
        .args(["--config", config.to_str().unwrap(), "config", "validate"])
        .assert()
        .failure();
}

#[test]
fn unknown_profile_fails_before_touching_a_browser() {
    let (_dir, config) = workspace();
    fastfill()
        .args(["--config", &config, "fill", "nobody"])
        .assert()
        .failure();
}
