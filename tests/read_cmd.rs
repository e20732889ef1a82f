use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cargo_bin() -> Command { Command::cargo_bin("buffalo").unwrap() }

// Three increments, then print: byte 3
fn small_valid_buffalo() -> &'static str {
    "Buffalo Buffalo Buffalo Buffalo Buffalo Buffalo."
}

fn read_to_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn test_read_positional_code_success() {
    cargo_bin()
        .arg("read").arg(small_valid_buffalo())
        .assert()
        .success()
        .stdout(predicate::eq("\u{3}\n"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_read_positional_parts_are_joined_with_spaces() {
    cargo_bin()
        .args(["read", "buffalo", "Buffalo", "Buffalo", "Buffalo", "."])
        .assert()
        .success()
        .stdout(predicate::eq("\u{1}\n"));
}

#[test]
fn test_read_file_success() {
    let tf = read_to_tempfile("Say it twice: Buffalo Buffalo\nthen print it.\n");
    cargo_bin()
        .arg("read").arg("--file").arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::eq("\u{1}\n"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_read_loop_program() {
    // cell0 = 2; while cell0: cell1 += 3, cell0 -= 1; print cell1
    let code = "Buffalo Buffalo Buffalo Buffalo ( buffalo Buffalo Buffalo Buffalo Buffalo Buffalo \
                Buffalo Buffalo Buffalo buffalo buffalo buffalo ) buffalo Buffalo .";
    cargo_bin()
        .arg("read").arg(code)
        .assert()
        .success()
        .stdout(predicate::eq("\u{6}\n"));
}

#[test]
fn test_read_debug_prints_table() {
    cargo_bin()
        .arg("read").arg("--debug").arg("Buffalo Buffalo.")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("STEP | IP")
                .and(predicate::str::contains("Increment cell[0] from 0 to 1"))
                .and(predicate::str::contains("suppressed in debug")),
        )
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_read_dump_reports_state() {
    cargo_bin()
        .arg("read").arg("--dump").arg("Buffalo Buffalo buffalo Buffalo")
        .assert()
        .success()
        .stderr(predicate::str::contains("pointer: 1").and(predicate::str::contains("[0]=1")));
}

#[test]
fn test_read_memory_size_clamps_pointer() {
    cargo_bin()
        .args(["read", "--memory-size", "2", "--dump"])
        .arg("buffalo Buffalo buffalo Buffalo buffalo Buffalo")
        .assert()
        .success()
        .stderr(predicate::str::contains("pointer: 1").and(predicate::str::contains("all 2 cells are 0")));
}
