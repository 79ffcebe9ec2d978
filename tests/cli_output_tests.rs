//! CLI output integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

fn modelgate() -> Command {
    cargo_bin_cmd!("modelgate")
}

#[test]
fn test_help() {
    modelgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("modelgate"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_version() {
    modelgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("modelgate"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    modelgate().arg("--no-such-flag").assert().failure();
}
