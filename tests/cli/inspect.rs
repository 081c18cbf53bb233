//! Tests for read-only queries.

use crate::support::*;

#[test]
fn test_secrets_lists_names_only() {
    let t = Test::with_project("api");
    t.write_env("TOKEN=hidden-value\n");
    assert_success(&t.secret_add());

    let output = t.run(&["secrets"]);
    assert_success(&output);
    assert_stdout_contains(&output, "TOKEN");
    assert!(!stdout(&output).contains("hidden-value"));
}

#[test]
fn test_secret_value_prints_value() {
    let t = Test::with_project("api");
    t.write_env("TOKEN=hidden-value\n");
    assert_success(&t.secret_add());

    let output = t.run(&["secret-value", "TOKEN"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "hidden-value\n");
}

#[test]
fn test_secret_value_unknown_name() {
    let t = Test::with_project("api");

    let output = t.run(&["secret-value", "MISSING"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "secret not found: MISSING");
}

#[test]
fn test_secrets_with_explicit_folder() {
    let t = Test::with_project("api");
    t.write_env("A=1\n");
    assert_success(&t.secret_add());
    let folder = json(&t.run(&["project", "show", "--json"]))["folder_id"]
        .as_str()
        .unwrap()
        .to_string();

    let other = Test::new();
    // same state and store, different working directory
    let output = t
        .cmd()
        .current_dir(other.dir.path())
        .args(["secrets", "--folder", &folder, "--json"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(json(&output)[0]["name"], "A");
}

#[test]
fn test_organizations_and_projects() {
    let t = Test::with_provider("offline");
    assert_success(&t.project_create("acme"));
    let acme = json(&t.run(&["project", "show", "--json"]))["folder_id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_success(&t.run(&["project", "create", "--name", "api", "--folder", &acme]));

    let orgs = json(&t.run(&["organizations", "--json"]));
    assert_eq!(orgs.as_array().unwrap().len(), 1);
    assert_eq!(orgs[0]["name"], "acme");

    let projects = json(&t.run(&["projects", "--root", &acme, "--json"]));
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["name"], "api");
}
