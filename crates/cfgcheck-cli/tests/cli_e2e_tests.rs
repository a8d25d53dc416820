//! End-to-end tests that invoke the compiled `validate-config` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn validate_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("validate-config"));
    cmd.env_remove("VALIDATE_CONFIG_STRICT")
        .env_remove("VALIDATE_CONFIG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/pyproject")
        .join(name)
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_output() {
    validate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--strict"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_missing_path_is_usage_error() {
    validate_cmd().assert().code(2);
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_clean_document_exits_zero() {
    validate_cmd()
        .arg(fixture("clean.toml"))
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("0 errors, 0 warnings"));
}

#[test]
fn test_profile_mismatch_exits_one() {
    validate_cmd()
        .arg(fixture("pep8-profile.toml"))
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "error[profile-mismatch] tool.isort.profile: ",
        ))
        .stdout(predicate::str::contains("\n").count(1));
}

#[test]
fn test_conflicting_dependencies_exit_one() {
    validate_cmd()
        .arg(fixture("conflicting-dependencies.toml"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "error[conflicting-constraints] tool.poetry.dev-dependencies.django",
        ));
}

#[test]
fn test_malformed_document_exits_two() {
    validate_cmd()
        .arg(fixture("malformed.toml"))
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_file_exits_two() {
    let temp = assert_fs::TempDir::new().unwrap();
    validate_cmd()
        .arg(temp.child("pyproject.toml").path())
        .assert()
        .code(2);
}

#[test]
fn test_unsupported_extension_exits_two_unless_format_given() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("pyproject.cfg");
    file.write_str("[tool.isort]\nprofile = \"black\"\n").unwrap();

    validate_cmd().arg(file.path()).assert().code(2);
    validate_cmd()
        .arg(file.path())
        .args(["--input-format", "toml"])
        .assert()
        .code(0);
}

// ============================================================================
// Flags
// ============================================================================

#[test]
fn test_strict_turns_warnings_into_failures() {
    let text = "[tool.black]\ncolour = true\n";

    validate_cmd()
        .args(["--inline", text])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("warning[unknown-key] tool.black.colour"));

    validate_cmd().args(["--inline", text, "--strict"]).assert().code(1);

    validate_cmd()
        .args(["--inline", text])
        .env("VALIDATE_CONFIG_STRICT", "true")
        .assert()
        .code(1);
}

#[test]
fn test_json_output() {
    let output = validate_cmd()
        .arg(fixture("duplicate-ignores.toml"))
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["violations"].as_array().unwrap().len(), 1);
    assert_eq!(document["violations"][0]["kind"], "duplicate-pattern");
    assert_eq!(document["summary"]["errors"], 1);
}

#[test]
fn test_format_from_environment() {
    let output = validate_cmd()
        .arg(fixture("pep8-profile.toml"))
        .env("VALIDATE_CONFIG_FORMAT", "json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["violations"][0]["kind"], "profile-mismatch");
    assert_eq!(document["summary"]["failing"], 1);

    // The flag wins over the environment
    validate_cmd()
        .arg(fixture("pep8-profile.toml"))
        .env("VALIDATE_CONFIG_FORMAT", "json")
        .args(["--format", "text"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("error[profile-mismatch] "));
}

#[test]
fn test_invalid_pylint_glob_is_reported_but_valid_glob_is_not() {
    let text = "[tool.pylint.TYPECHECK]\nignored-modules = [\"celery*\", \"kombu..x\"]\n";
    validate_cmd()
        .args(["--inline", text])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid-module-pattern").count(1))
        .stdout(predicate::str::contains("celery*").not());
}

#[test]
fn test_inline_yaml() {
    validate_cmd()
        .args([
            "--inline",
            "tool:\n  black:\n    line-length: 100\n  isort:\n    profile: black\n",
            "--input-format",
            "yaml",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("line-length-mismatch"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    validate_cmd()
        .arg(fixture("clean.toml"))
        .arg("-v")
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("validation finished"));
}
