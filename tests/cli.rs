//! Exit-code contract of the `adder-selftest` binary

#![cfg(feature = "std")]

use std::process::{Command, Output};

fn selftest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_adder-selftest"))
        .args(args)
        .output()
        .expect("failed to run adder-selftest")
}

#[test]
fn default_run_exits_zero() {
    let output = selftest(&[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn forced_sum_prints_mismatch_and_exits_one() {
    let output = selftest(&["--force-sum", "10"]);
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Hardware result 10 does not match reference value 9"));
}

#[test]
fn stalled_peripheral_exits_two() {
    let output = selftest(&["--stall-done", "--done-timeout-us", "1000"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("peripheral timed out waiting for DONE (last status 0x00)"));
    assert!(output.stdout.is_empty());
}

#[test]
fn custom_operands_with_delays_pass() {
    let output = selftest(&[
        "--x",
        "4294967295",
        "--y",
        "2",
        "--ready-after",
        "3",
        "--done-after",
        "3",
        "--verbose",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("4294967295 + 2 = 1"));
}
