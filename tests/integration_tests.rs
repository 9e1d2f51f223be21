use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, diff};

fn hackc() -> Command {
    let mut cmd = Command::cargo_bin("hackc").unwrap();
    cmd.env_remove("HACKC_FEATURES");
    cmd
}

#[test]
fn prints_help() {
    hackc().arg("--help").assert().success().stdout(contains("assemble"));
}

#[test]
fn requires_subcommand() {
    hackc().assert().failure();
}

#[test]
fn assembles_add() {
    hackc()
        .arg("assemble")
        .arg("tests/files/add.asm")
        .arg("--print")
        .assert()
        .success()
        .stdout(diff(include_str!("expected/add.hack").replace("\r\n", "\n")));
}

#[test]
fn assembles_labels_and_forward_references() {
    hackc()
        .arg("assemble")
        .arg("tests/files/max.asm")
        .arg("--print")
        .assert()
        .success()
        .stdout(diff(include_str!("expected/max.hack").replace("\r\n", "\n")));
}

#[test]
fn runs_vm_program() {
    hackc()
        .arg("run")
        .arg("tests/files/simple_add.vm")
        .assert()
        .success()
        .stdout(contains("SP: 257"))
        .stdout(contains("top: 15"));
}

#[test]
fn runs_assembled_program() {
    hackc()
        .arg("run")
        .arg("tests/expected/max.hack")
        .arg("--cycles")
        .arg("100")
        .assert()
        .success()
        .stderr(contains("halted"));
}

#[test]
fn run_reports_exhausted_cycle_limit() {
    hackc()
        .arg("run")
        .arg("tests/expected/max.hack")
        .arg("--cycles")
        .arg("3")
        .assert()
        .success()
        .stderr(contains("Failed"))
        .stderr(contains("cycle limit reached"))
        .stdout(contains("cycles: 3"));
}

#[test]
fn translate_prints_annotated_asm() {
    hackc()
        .arg("translate")
        .arg("tests/files/simple_add.vm")
        .arg("--print")
        .assert()
        .success()
        .stdout(contains("// push constant 7\n@7\nD=A"))
        .stdout(contains("@256"));
}

#[test]
fn features_flag_controls_output() {
    hackc()
        .arg("translate")
        .arg("tests/files/simple_add.vm")
        .arg("--print")
        .arg("--features")
        .arg("halt")
        .assert()
        .success()
        .stdout(contains("//").not())
        .stdout(contains("@256").not())
        .stdout(contains("($HALT)"));
}

#[test]
fn builds_directory_of_units() {
    hackc()
        .arg("build")
        .arg("tests/files/multi")
        .arg("--print")
        .assert()
        .success()
        .stdout(contains("0000000000010000"));
}

#[test]
fn check_reports_vm_errors() {
    hackc()
        .arg("check")
        .arg("tests/files/bad_segment.vm")
        .assert()
        .failure()
        .stderr(contains("vm::segment"))
        .stderr(contains("line 3"));
}

#[test]
fn assemble_reports_unknown_comp() {
    hackc()
        .arg("assemble")
        .arg("tests/files/bad_comp.asm")
        .arg("--print")
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("asm::comp"))
        .stderr(contains("D*A"));
}

#[test]
fn rejects_unknown_features() {
    hackc()
        .arg("check")
        .arg("tests/files/add.asm")
        .arg("--features")
        .arg("turbo")
        .assert()
        .failure()
        .stderr(contains("Unknown feature"));
}
