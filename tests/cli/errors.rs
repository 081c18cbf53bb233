//! Tests for error handling and CLI flags.

use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.run(&["--help"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("provider"));
    assert!(out.contains("project"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();
    assert_failure(&t.run(&["unknown-command"]));
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.run(&["--version"]);
    assert_success(&output);
    assert_stdout_contains(&output, "nsm");
}

#[test]
fn test_no_active_provider_is_fatal_with_hint() {
    let t = Test::new();

    let output = t.run(&["secrets"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "no active provider");
    assert_stderr_contains(&output, "nsm provider add");
}

#[test]
fn test_unknown_provider_override() {
    let t = Test::with_provider("offline");

    let output = t.cmd().env("NSM_PROVIDER", "ghost").arg("secrets").output().unwrap();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "provider not found: ghost");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let t = Test::with_provider("offline");

    let output = t.run(&["--verbose", "provider", "list", "--json"]);
    assert_success(&output);
    // stdout stays valid JSON with logging on
    json(&output);
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    let output = t.run(&["completions", "bash"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("_nsm") || out.contains("complete"));
}

#[test]
fn test_completions_zsh() {
    let t = Test::new();

    let output = t.run(&["completions", "zsh"]);
    assert_success(&output);
    assert_stdout_contains(&output, "#compdef nsm");
}

#[test]
fn test_malformed_registry_is_fatal() {
    use predicates::prelude::*;

    let t = Test::new();
    std::fs::create_dir_all(t.state_dir()).unwrap();
    std::fs::write(t.state_dir().join("providers.toml"), "active = [").unwrap();

    t.cmd()
        .args(["provider", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("malformed").and(predicate::str::contains("providers.toml")));
}
