use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn bench_reports_a_row_per_metric_and_dimension() {
    let mut cmd = Command::cargo_bin("gigavector").unwrap();
    cmd.args(["bench", "--dims", "16,32", "--iterations", "50"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Euclidean"))
        .stdout(predicate::str::contains("Cosine"))
        .stdout(predicate::str::contains("Dot"));
}

#[test]
fn bench_rejects_nothing_and_always_runs_with_defaults() {
    let mut cmd = Command::cargo_bin("gigavector").unwrap();
    cmd.arg("bench");
    cmd.assert().success();
}

#[test]
fn repl_exits_cleanly_on_exit_command() {
    let mut cmd = Command::cargo_bin("gigavector").unwrap();
    cmd.arg("repl").write_stdin("list\nexit\n");
    cmd.assert().success();
}

#[test]
fn repl_create_insert_search_round_trip() {
    let mut cmd = Command::cargo_bin("gigavector").unwrap();
    cmd.arg("repl").write_stdin(
        "create docs 2 flat\ninsert docs 1.0 0.0\nsearch docs 1 1.0 0.0\nexit\n",
    );
    cmd.assert().success().stdout(predicate::str::contains("0.000000"));
}
