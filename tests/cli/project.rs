//! Tests for `nsm project create|show|remove`.

use crate::support::*;

#[test]
fn test_create_binds_current_dir() {
    let t = Test::with_provider("offline");

    let output = t.project_create("api");
    assert_success(&output);
    assert_stdout_contains(&output, "bound");

    let shown = json(&t.run(&["project", "show", "--json"]));
    assert_eq!(shown["folder_name"], "api");
    assert_eq!(shown["provider"], "offline");
}

#[test]
fn test_create_twice_reuses_folder() {
    let t = Test::with_provider("offline");
    assert_success(&t.project_create("api"));
    let first = json(&t.run(&["project", "show", "--json"]))["folder_id"].clone();

    assert_success(&t.project_create("api"));
    let second = json(&t.run(&["project", "show", "--json"]))["folder_id"].clone();

    assert_eq!(first, second);
    let projects = json(&t.run(&["projects", "--json"]));
    assert_eq!(projects.as_array().unwrap().len(), 1);
}

#[test]
fn test_create_under_missing_parent_fails() {
    let t = Test::with_provider("offline");

    let output = t.run(&["project", "create", "--name", "api", "--folder", "nope"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "folder not found");
}

#[test]
fn test_show_without_binding() {
    let t = Test::with_provider("offline");

    let output = t.run(&["project", "show"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "no project bound");
    assert_stderr_contains(&output, "nsm project create");
}

#[test]
fn test_remove_unbinds() {
    let t = Test::with_project("api");

    assert_success(&t.run(&["project", "remove"]));
    assert_exit_code(&t.run(&["project", "show"]), 1);
    assert_exit_code(&t.run(&["project", "remove"]), 1);
}

#[test]
fn test_binding_is_per_provider() {
    let t = Test::with_project("api");
    assert_success(&t.provider_add_local("other"));

    let output = t.cmd().args(["--provider", "other", "project", "show"]).output().unwrap();
    assert_exit_code(&output, 1);
    assert_success(&t.run(&["project", "show"]));
}
