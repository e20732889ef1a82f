use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command { Command::cargo_bin("buffalo").unwrap() }

fn small_valid_buffalo() -> &'static str { "Buffalo Buffalo Buffalo Buffalo Buffalo Buffalo." }

// cell0 = 1 and the empty loop body never changes it
fn infinite_buffalo() -> &'static str { "Buffalo Buffalo ( )" }

#[test]
fn test_stdout_only_for_program_output() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .write_stdin(small_valid_buffalo())
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{3}"))
        .stderr(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_stderr_only_for_abort_messages() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .env("BUFFALO_TIMEOUT_MS", "100")
        .write_stdin(infinite_buffalo())
        .assert()
        .stderr(predicate::str::contains("Execution aborted"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_read_timeout_flag() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .args(["read", "--timeout", "100", infinite_buffalo()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wall-clock timeout exceeded (100 ms)"));
}

#[test]
fn test_read_step_limit() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .args(["read", "--max-steps", "50", infinite_buffalo()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"));
}

#[test]
fn test_step_limit_from_env() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .env("BUFFALO_MAX_STEPS", "10")
        .args(["read", infinite_buffalo()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (10)"));
}
