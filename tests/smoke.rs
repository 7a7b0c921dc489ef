//! Smoke tests -- verify the binary runs and key subcommands exist.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Playback source triage and auto-selection",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("streamtriage"));
}

#[test]
fn test_select_subcommand_exists() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .args(["select", "--help"])
        .assert()
        .success();
}

#[test]
fn test_probe_subcommand_exists() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .args(["probe", "--help"])
        .assert()
        .success();
}

#[test]
fn test_records_list_subcommand_exists() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .args(["records", "list", "--help"])
        .assert()
        .success();
}

#[test]
fn test_skip_set_subcommand_exists() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .args(["skip", "set", "--help"])
        .assert()
        .success();
}

#[test]
fn test_block_ad_subcommand_exists() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .args(["block-ad", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("show"));
}

#[test]
fn test_select_missing_manifest_fails() {
    Command::cargo_bin("streamtriage")
        .unwrap()
        .args(["select", "--manifest", "/nonexistent/candidates.json"])
        .assert()
        .failure();
}
