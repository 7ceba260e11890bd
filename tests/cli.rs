use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn scriptit_runs_quickstart() {
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("demos/quickstart.sit");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello from ScriptIt!"))
        .stdout(predicate::str::contains("sum of squares: 55"))
        .stdout(predicate::str::contains("3 is odd"))
        .stdout(predicate::str::contains("3 names: [\"ada\", \"grace\", \"linus\"]"))
        .stdout(predicate::str::contains("1267650600228229401496703205376"));
}

#[test]
fn scriptit_run_echoes_expressions_and_continues_after_errors() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("broken.sit");
    fs::write(&script, "1 + 1.\nundefined_name.\nprint(\"still running\").\n")
        .expect("write script");

    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("2\n"))
        .stdout(predicate::str::contains(
            "Error: UndefinedVariableError: undefined variable `undefined_name`",
        ))
        .stdout(predicate::str::contains("still running"));
}

#[test]
fn scriptit_run_reads_stdin() {
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("run").arg("-").write_stdin("print(\"from stdin\").\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("from stdin"));
}

#[test]
fn scriptit_eval_snippet() {
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("eval").arg("1 + 2 + 3.");
    cmd.assert().success().stdout(predicate::str::contains("6"));
}

#[test]
fn scriptit_eval_reports_errors() {
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("eval").arg("1 / 0.");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Error: DivisionByZeroError"));
}

#[test]
fn scriptit_limits_call_depth() {
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("eval").arg("fn down(n): give down(n + 1). ; down(0).");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("maximum call depth"));
}

#[test]
fn scriptit_missing_script_fails() {
    let dir = tempdir().expect("create temp dir");
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("run").arg(dir.path().join("nope.sit"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error: I/O error"));
}

#[test]
fn scriptit_kernel_speaks_json_lines() {
    let mut cmd = Command::cargo_bin("scriptit").expect("binary exists");
    cmd.arg("kernel").write_stdin(concat!(
        r#"{"action":"execute","cell_id":"a","code":"print(\"hi\"). 40 + 2."}"#,
        "\n",
        r#"{"action":"shutdown"}"#,
        "\n",
    ));
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(
            r#"{"status":"kernel_ready","version":"2.0"}"#,
        ))
        .stdout(predicate::str::contains(r#""result":"42""#))
        .stdout(predicate::str::contains(r#""stdout":"hi\n""#))
        .stdout(predicate::str::contains(r#"{"status":"shutdown_ok"}"#));
}
