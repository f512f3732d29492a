use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper function to create a temporary directory for CLI tests
fn create_cli_test_environment() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Helper function to create a Command with --no-color and an isolated
/// journal directory
fn wp_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wp").expect("Failed to find wp binary");
    cmd.env_remove("WAYPOINT_TRIP")
        .env_remove("WAYPOINT_SQLITE")
        .env_remove("WAYPOINT_ASSISTANT")
        .arg("--no-color")
        .arg("--storage-dir")
        .arg(dir.join("journals"));
    cmd
}

fn create_rome(dir: &Path) {
    wp_cmd(dir)
        .args([
            "run",
            "/create-trip rome name=\"Rome in May\"",
            "/add name=Colosseum type=sight date=2025-05-02",
        ])
        .assert()
        .success();
}

#[test]
fn test_cli_run_creates_trip() {
    let temp_dir = create_cli_test_environment();

    wp_cmd(temp_dir.path())
        .args([
            "run",
            "/create-trip rome name=\"Rome in May\"",
            "/add name=Colosseum type=sight date=2025-05-02",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created trip 'rome'."))
        .stdout(predicate::str::contains("Added item"))
        .stdout(predicate::str::contains("2 command(s) run"));

    assert!(temp_dir.path().join("journals/trips/rome/journal").is_file());
}

#[test]
fn test_cli_show_trip() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    wp_cmd(temp_dir.path())
        .args(["show", "--trip", "rome"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Rome in May"))
        .stdout(predicate::str::contains("Colosseum"))
        .stdout(predicate::str::contains("Fri 2025-05-02"));
}

#[test]
fn test_cli_requires_a_trip() {
    let temp_dir = create_cli_test_environment();

    wp_cmd(temp_dir.path())
        .args(["run", "/add name=Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No trip selected"));
}

#[test]
fn test_cli_use_sets_current_trip() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    wp_cmd(temp_dir.path())
        .args(["use", "rome"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current trip is now 'rome'."));

    wp_cmd(temp_dir.path())
        .args(["run", "/add name=Pantheon", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pantheon"));

    wp_cmd(temp_dir.path())
        .arg("trips")
        .assert()
        .success()
        .stdout(predicate::str::contains("- rome (current)"));
}

#[test]
fn test_cli_reads_commands_from_stdin() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    wp_cmd(temp_dir.path())
        .args(["run", "--trip", "rome"])
        .write_stdin("/add name=\"Trevi Fountain\"\n/undo\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Undid 1 command"));
}

#[test]
fn test_cli_creates_trip_from_stdin() {
    let temp_dir = create_cli_test_environment();

    wp_cmd(temp_dir.path())
        .arg("run")
        .write_stdin("/create-trip oslo name=\"Oslo\"\n/add name=\"Opera House\"\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created trip 'oslo'"));

    wp_cmd(temp_dir.path())
        .args(["show", "--trip", "oslo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opera House"));
}

#[test]
fn test_cli_rejects_malformed_batch() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    wp_cmd(temp_dir.path())
        .args(["run", "--trip", "rome", "/add name=Ok", "/edit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2: /edit requires 'id'"));

    wp_cmd(temp_dir.path())
        .args(["show", "--trip", "rome"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ok").not());
}

#[test]
fn test_cli_log_shows_timeline_states() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());
    wp_cmd(temp_dir.path())
        .args(["run", "--trip", "rome", "/undo"])
        .assert()
        .success();

    wp_cmd(temp_dir.path())
        .args(["log", "--trip", "rome"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[applied]"))
        .stdout(predicate::str::contains("[undone]"))
        .stdout(predicate::str::contains("[marker] `/undo count=1`"));
}

#[test]
fn test_cli_json_output() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    let output = wp_cmd(temp_dir.path())
        .args(["--json", "show", "--trip", "rome"])
        .output()
        .expect("Failed to run wp");
    assert!(output.status.success());
    let model: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(model["id"], "rome");
    assert_eq!(model["items"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_cli_syntax_help() {
    let temp_dir = create_cli_test_environment();

    wp_cmd(temp_dir.path())
        .args(["syntax", "undo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/undo [count]"));
}

#[test]
fn test_cli_renormalize() {
    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    wp_cmd(temp_dir.path())
        .arg("renormalize")
        .assert()
        .success()
        .stdout(predicate::str::contains("rome: 2 line(s) read, 2 rewritten"));
    assert!(temp_dir
        .path()
        .join("journals/trips/rome/journal.canonical")
        .is_file());
}

#[test]
fn test_cli_sqlite_storage() {
    let temp_dir = create_cli_test_environment();
    let db_path = temp_dir.path().join("waypoint.db");

    Command::cargo_bin("wp")
        .expect("Failed to find wp binary")
        .env_remove("WAYPOINT_STORAGE_DIR")
        .args(["--no-color", "--sqlite", db_path.to_str().unwrap()])
        .args(["run", "/create-trip oslo"])
        .assert()
        .success();

    Command::cargo_bin("wp")
        .expect("Failed to find wp binary")
        .env_remove("WAYPOINT_STORAGE_DIR")
        .args(["--no-color", "--sqlite", db_path.to_str().unwrap(), "trips"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- oslo"));
}

#[cfg(unix)]
#[test]
fn test_cli_ask_runs_assistant_program() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = create_cli_test_environment();
    create_rome(temp_dir.path());

    let script = temp_dir.path().join("assistant.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\ncat > /dev/null\necho '/add name=\"Giolitti\" type=food'\n",
    )
    .expect("write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");

    wp_cmd(temp_dir.path())
        .args(["ask", "--trip", "rome", "Find gelato"])
        .arg("--assistant-cmd")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("completed: 1 command(s)"));

    wp_cmd(temp_dir.path())
        .args(["show", "--trip", "rome"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Giolitti"));
}
