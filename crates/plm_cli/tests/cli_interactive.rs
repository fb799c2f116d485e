mod common;

use common::{FixtureServer, stderr, stdout};

fn count(server: &FixtureServer, method: &str, url: &str) -> usize {
    server
        .requests()
        .iter()
        .filter(|seen| seen.method == method && seen.url == url)
        .count()
}

#[test]
fn interactive_help_shows_usage() {
    let server = FixtureServer::start();

    let output = server.run_interactive("help\nexit\n");

    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage"));
}

#[test]
fn interactive_invalid_command_prints_error_and_continues() {
    let server = FixtureServer::start();

    let output = server.run_interactive("nope\ntasks --json\nexit\n");

    assert!(output.status.success());
    assert!(stderr(&output).contains("ERROR: invalid_input"));
    assert!(stdout(&output).contains("\"tasks\""));
}

#[test]
fn interactive_session_reuses_the_base_list() {
    let server = FixtureServer::start();

    let output = server.run_interactive("tasks\ntasks --year 2024\ntask show 1\nquit\n");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(count(&server, "GET", "/plm_tasks_matched"), 1);
}

#[test]
fn interactive_mutation_reloads_the_base_list() {
    let server = FixtureServer::start();

    let output = server
        .run_interactive("tasks\ntask edit 1 --description \"Grubbern tief\"\ntasks\nexit\n");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(count(&server, "GET", "/plm_tasks_matched"), 2);
    let writes = server.writes();
    assert_eq!(writes.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&writes[0].body).unwrap();
    assert_eq!(body["description"], "Grubbern tief");
}

#[test]
fn interactive_delete_needs_a_repeated_command() {
    let server = FixtureServer::start();

    let output = server.run_interactive("fieldinfo delete 40\nfieldinfo delete 40\nexit\n");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Deleted field info 40"));
    assert_eq!(count(&server, "DELETE", "/plm_fieldinfo/40"), 1);
}

#[test]
fn interactive_other_command_cancels_pending_delete() {
    let server = FixtureServer::start();

    let output =
        server.run_interactive("fieldinfo delete 40\nfieldinfo years\nfieldinfo delete 40\nexit\n");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(server.writes().is_empty());
}

#[test]
fn interactive_rejects_config_overrides() {
    let server = FixtureServer::start();

    let output = server.run_interactive("tasks --config-override theme=dark\nexit\n");

    assert!(output.status.success());
    assert!(stderr(&output).contains("only accepted on the command line"));
}
