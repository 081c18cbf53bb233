//! Tests for `nsm provider`.

use crate::support::*;

#[test]
fn test_add_and_list() {
    let t = Test::new();

    let output = t.provider_add_local("offline");
    assert_success(&output);
    assert_stdout_contains(&output, "added offline");

    let listed = json(&t.provider_list_json());
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["providers"][0]["name"], "offline");
    assert_eq!(listed["providers"][0]["kind"], "local");
    assert_eq!(listed["active"], serde_json::Value::Null);
}

#[test]
fn test_add_existing_name_replaces_with_warning() {
    let t = Test::new();
    assert_success(&t.provider_add_local("offline"));

    let output = t.provider_add_local("offline");
    assert_success(&output);
    assert_stderr_contains(&output, "replaced existing provider");
    assert_eq!(json(&t.provider_list_json())["count"], 1);
}

#[test]
fn test_add_unsupported_kind() {
    let t = Test::new();

    let output = t.run(&["provider", "add", "x", "vault"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "unsupported provider kind");
}

#[test]
fn test_add_local_requires_path() {
    let t = Test::new();

    let output = t.run(&["provider", "add", "x", "local"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "missing connection setting 'path'");
}

#[test]
fn test_list_redacts_credentials() {
    let t = Test::new();
    assert_success(&t.run(&[
        "provider",
        "add",
        "work",
        "passbolt",
        "--server",
        "https://pb.example.com",
        "--passphrase-env",
        "PB_PASS",
        "--set",
        "api_token=abc123",
    ]));

    let listed = json(&t.provider_list_json());
    let connection = &listed["providers"][0]["connection"];
    assert_eq!(connection["server"], "https://pb.example.com");
    assert_eq!(connection["passphrase_env"], "********");
    assert_eq!(connection["api_token"], "********");
    assert!(!stdout(&t.provider_list_json()).contains("abc123"));
}

#[test]
fn test_use_unknown_keeps_previous() {
    let t = Test::with_provider("offline");

    let output = t.provider_use("ghost");
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "provider not found");

    assert_eq!(json(&t.provider_list_json())["active"], "offline");
}

#[test]
fn test_current_shows_active() {
    let t = Test::with_provider("offline");

    let output = t.run(&["provider", "current"]);
    assert_success(&output);
    assert_stdout_contains(&output, "offline");
    assert_stdout_contains(&output, "local");
}

#[test]
fn test_remove_active_requires_force() {
    let t = Test::with_provider("offline");

    let output = t.run(&["provider", "remove", "offline"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "--force");

    assert_success(&t.run(&["provider", "remove", "offline", "--force"]));
    let listed = json(&t.provider_list_json());
    assert_eq!(listed["count"], 0);
    assert_eq!(listed["active"], serde_json::Value::Null);
}

#[test]
fn test_remove_inactive() {
    let t = Test::with_provider("offline");
    assert_success(&t.provider_add_local("spare"));

    assert_success(&t.run(&["provider", "remove", "spare"]));
    assert_eq!(json(&t.provider_list_json())["count"], 1);
}

#[test]
fn test_state_file_written_to_nsm_home() {
    let t = Test::with_provider("offline");
    let registry = std::fs::read_to_string(t.state_dir().join("providers.toml")).unwrap();

    assert!(registry.contains("active = \"offline\""));
    assert!(registry.contains("[providers.offline]"));
}
