//! Smoke tests of the `whorl` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::process::Command;

use tempfile::TempDir;

fn whorl() -> Command {
    Command::new(env!("CARGO_BIN_EXE_whorl"))
}

#[test]
fn help_succeeds() {
    let output = whorl().arg("help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("Commands:"));
}

#[test]
fn no_arguments_fail_with_usage() {
    let output = whorl().output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("Usage:"));
}

#[test]
fn exit_code_follows_syntax_issues() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.calc");
    let bad = dir.path().join("bad.calc");
    std::fs::write(&good, "1;").unwrap();
    std::fs::write(&bad, "1 $;").unwrap();

    let output = whorl().arg("parse").arg(&good).output().unwrap();
    assert!(output.status.success());

    let output = whorl().arg("parse").arg(&bad).output().unwrap();
    assert!(!output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("unexpected character `$`"), "{text}");
}

#[test]
fn unknown_command_is_reported() {
    let output = whorl().arg("frobnicate").output().unwrap();
    assert!(!output.status.success());
    let err = String::from_utf8(output.stderr).unwrap();
    assert!(err.contains("unknown command 'frobnicate'"), "{err}");
}
