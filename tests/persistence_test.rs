#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

fn run(db_path: &std::path::Path) -> String {
    let mut cmd = Command::new(cargo_bin!("loanops"));
    cmd.arg("remind")
        .arg("--repayments")
        .arg("tests/fixtures/repayments.csv")
        .arg("--as-of")
        .arg("2026-10-16")
        .arg("--audit-db")
        .arg(db_path);

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_audit_trail_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("audit_db");

    // Each run reloads the overdue repayment as pending and escalates it again.
    let first = run(&db_path);
    assert!(first.contains("audit_records,1"));

    let second = run(&db_path);
    assert!(second.contains("audit_records,2"));
}
