// ABOUTME: Integration tests for the dockyard CLI commands.
// ABOUTME: Validates --help output and configuration errors.

use assert_cmd::Command;
use predicates::prelude::*;

fn dockyard_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("dockyard"))
}

#[test]
fn help_shows_commands() {
    dockyard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("reap"));
}

#[test]
fn up_help_mentions_config() {
    dockyard_cmd()
        .args(["up", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    dockyard_cmd()
        .current_dir(dir.path())
        .args(["up", "--config", "does-not-exist.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn invalid_config_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dockyard.yml"), "host_alias: \"\"\n").unwrap();
    dockyard_cmd()
        .current_dir(dir.path())
        .arg("reap")
        .assert()
        .failure()
        .stderr(predicate::str::contains("host alias"));
}
