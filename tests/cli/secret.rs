//! Tests for `nsm project secret add|restore|clean`.

use crate::support::*;

#[test]
fn test_add_creates_all_keys() {
    let t = Test::with_project("api");
    t.write_env(STANDARD_ENV);

    let output = t.secret_add_json();
    assert_success(&output);

    let report = json(&output);
    assert_eq!(report["operation"], "add");
    assert_eq!(report["status"], "success");
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), STANDARD_SECRETS.len());
    assert!(outcomes.iter().all(|o| o["status"] == "created"));
}

#[test]
fn test_add_twice_is_unchanged() {
    let t = Test::with_project("api");
    t.write_env(STANDARD_ENV);
    assert_success(&t.secret_add());

    let report = json(&t.secret_add_json());
    assert!(report["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|o| o["status"] == "unchanged"));
}

#[test]
fn test_add_updates_changed_value() {
    let t = Test::with_project("api");
    t.write_env("A=1\n");
    assert_success(&t.secret_add());

    t.write_env("A=2\nB=3\n");
    let report = json(&t.secret_add_json());

    assert_eq!(report["outcomes"][0]["key"], "A");
    assert_eq!(report["outcomes"][0]["status"], "updated");
    assert_eq!(report["outcomes"][1]["key"], "B");
    assert_eq!(report["outcomes"][1]["status"], "created");
}

#[test]
fn test_add_with_one_unreadable_secret_exits_2() {
    let t = Test::with_project("api");
    t.write_env("A=1\nB=2\nC=3\n");
    assert_success(&t.secret_add());
    t.corrupt_stored_value("B");

    t.write_env("A=10\nB=20\nC=30\n");
    let output = t.secret_add();

    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "failed B (decryption failed)");
    assert_stderr_contains(&output, "add: 1 of 3 keys failed");
    assert_stdout_contains(&output, "updated A");
    assert_stdout_contains(&output, "updated C");

    assert_stdout_contains(&t.run(&["secret-value", "A"]), "10");
    assert_stdout_contains(&t.run(&["secret-value", "C"]), "30");
    let names: Vec<_> = json(&t.secrets_json())
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn test_add_json_reports_partial_failure() {
    let t = Test::with_project("api");
    t.write_env("A=1\nB=2\n");
    assert_success(&t.secret_add());
    t.corrupt_stored_value("A");

    t.write_env("A=1\nB=5\n");
    let output = t.secret_add_json();
    assert_exit_code(&output, 2);

    let report = json(&output);
    assert_eq!(report["status"], "partial_failure");
    assert_eq!(report["outcomes"][0]["key"], "A");
    assert_eq!(report["outcomes"][0]["status"], "failed");
    assert_eq!(report["outcomes"][0]["kind"], "decryption_failed");
    assert_eq!(report["outcomes"][1]["key"], "B");
    assert_eq!(report["outcomes"][1]["status"], "updated");
}

#[test]
fn test_add_dry_run_changes_nothing() {
    let t = Test::with_project("api");
    t.write_env("A=1\nB=2\n");

    let output = t.run(&["project", "secret", "add", "--dry-run"]);
    assert_success(&output);
    assert_stdout_contains(&output, "CREATE A");
    assert_stdout_contains(&output, "CREATE B");

    let listed = json(&t.secrets_json());
    assert!(listed.as_array().unwrap().is_empty());
}

#[test]
fn test_add_malformed_file_is_fatal() {
    let t = Test::with_project("api");
    t.write_env("A=1\nthis line is broken\n");

    let output = t.secret_add();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "line 2");
    assert!(json(&t.secrets_json()).as_array().unwrap().is_empty());
}

#[test]
fn test_add_missing_file_is_fatal() {
    let t = Test::with_project("api");

    let output = t.secret_add();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "cannot read");
}

#[test]
fn test_add_without_binding() {
    let t = Test::with_provider("offline");
    t.write_env("A=1\n");

    let output = t.secret_add();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "no project bound");
}

#[test]
fn test_add_explicit_file() {
    let t = Test::with_project("api");
    std::fs::write(t.path("prod.env"), "P=1\n").unwrap();

    assert_success(&t.run(&["project", "secret", "add", "prod.env"]));
    assert_success(&t.run(&["project", "secret", "restore", "restored.env"]));

    assert_eq!(
        std::fs::read_to_string(t.path("restored.env")).unwrap(),
        "P=1\n"
    );
}

#[test]
fn test_restore_writes_sorted_file() {
    let t = Test::with_project("api");
    t.write_env("Z=last\nA=first\nM=with space\n");
    assert_success(&t.secret_add());
    std::fs::remove_file(t.path(".env")).unwrap();

    let output = t.secret_restore();
    assert_success(&output);
    assert_stdout_contains(&output, "restored 3 secrets");

    assert_eq!(t.read_env(), "A=first\nM=\"with space\"\nZ=last\n");
}

#[test]
fn test_restore_then_add_is_noop() {
    let t = Test::with_project("api");
    t.write_env(SAMPLE_ENV_COMPLEX);
    assert_success(&t.secret_add());
    assert_success(&t.secret_restore());

    let report = json(&t.secret_add_json());
    assert!(report["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|o| o["status"] == "unchanged"));
}

#[test]
fn test_clean_then_restore_is_empty() {
    let t = Test::with_project("api");
    t.write_env(STANDARD_ENV);
    assert_success(&t.secret_add());

    let output = t.run(&["project", "secret", "clean", "--yes", "--json"]);
    assert_success(&output);
    let report = json(&output);
    assert_eq!(report["operation"], "clean");
    assert_eq!(report["outcomes"].as_array().unwrap().len(), 3);

    assert_success(&t.secret_restore());
    assert_eq!(t.read_env(), "");
}

#[test]
fn test_clean_dry_run_keeps_secrets() {
    let t = Test::with_project("api");
    t.write_env("A=1\n");
    assert_success(&t.secret_add());

    let output = t.run(&["project", "secret", "clean", "--dry-run"]);
    assert_success(&output);
    assert_stdout_contains(&output, "DELETE A");
    assert_eq!(json(&t.secrets_json()).as_array().unwrap().len(), 1);
}

#[test]
fn test_clean_empty_folder() {
    let t = Test::with_project("api");

    let output = t.secret_clean();
    assert_success(&output);
    assert_stdout_contains(&output, "already empty");
}

#[test]
fn test_corrupt_store_is_fatal() {
    let t = Test::with_project("api");
    std::fs::write(t.store.path().join("store.json"), "{ broken").unwrap();
    t.write_env("A=1\n");

    let output = t.secret_add();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "corrupt state");
}
