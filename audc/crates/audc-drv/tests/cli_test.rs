//! CLI end-to-end tests for the `audc` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn audc() -> Command {
    Command::cargo_bin("audc").expect("audc binary builds")
}

#[test]
fn eval_hello_world() {
    audc()
        .args(["--eval", "print(\"Hello world\");"])
        .assert()
        .success()
        .stdout("Hello world\n");
}

#[test]
fn runs_a_source_file() {
    let mut file = tempfile::Builder::new().suffix(".aud").tempfile().unwrap();
    writeln!(file, "int x = 6 * 7;\nprint(itos(x));").unwrap();

    audc()
        .arg(file.path())
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn requires_a_source() {
    audc().assert().failure();
}

#[test]
fn file_and_eval_are_exclusive() {
    audc()
        .args(["program.aud", "--eval", "print(\"x\");"])
        .assert()
        .failure();
}

#[test]
fn runtime_fault_sets_exit_code() {
    audc()
        .args(["--eval", "int x = 10 / 0;"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[1, 9] Division by zero"));
}

#[test]
fn type_error_reported_with_position() {
    audc()
        .args(["--eval", "int x = \"abc\";"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[1, 9] Invalid type"));
}

#[test]
fn lexer_error_reported_with_position() {
    audc()
        .args(["--eval", "string s = \"open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[1, 12] Invalid value"));
}

#[test]
fn lex_mode_dumps_tokens() {
    audc()
        .args(["--mode", "lex", "--eval", "while (x) { }"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1, 1] while"))
        .stdout(predicate::str::contains("<eof>"));
}

#[test]
fn parse_mode_pretty_prints() {
    audc()
        .args(["--mode", "parse", "--eval", "int x = 1 + 2;"])
        .assert()
        .success()
        .stdout(predicate::str::contains("int x = 1 + 2;"));
}

#[test]
fn check_mode_is_quiet_on_success() {
    audc()
        .args(["--mode", "check", "--eval", "print(\"not run\");"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn config_file_overrides_limits() {
    let mut config = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(config, "{{\"MAX_FUNC_DEPTH\": 3}}").unwrap();

    audc()
        .args(["--config"])
        .arg(config.path())
        .args([
            "--eval",
            "func int r(int v) { return r(v + 1); } int y = r(1);",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Call stack limit exceeded"));
}

#[test]
fn stdin_feeds_input_builtin() {
    audc()
        .args(["--eval", "print(\"hi \" + input());"])
        .write_stdin("there\n")
        .assert()
        .success()
        .stdout("hi there\n");
}

#[test]
fn version_flag() {
    audc()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("audc"));
}
