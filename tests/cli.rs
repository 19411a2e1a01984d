use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const DAY: i64 = 86_400_000;

fn expenses(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("expenses").unwrap();
    cmd.env("HOME", home);
    cmd
}

fn sample_backup() -> String {
    format!(
        "$ENTITY:currency\n_id:1\nname:EUR\n$$\n\
         $ENTITY:account\n_id:1\ntitle:Checking\ntype:BANK\ncurrency_id:1\n\
         total_amount:10000\nis_active:1\nis_include_into_totals:1\nsort_order:0\n\
         creation_date:1000\n$$\n\
         $ENTITY:transactions\n_id:1\nfrom_account_id:1\nfrom_amount:500\n\
         to_account_id:0\nto_amount:0\ndatetime:{}\nupdated_on:0\n$$\n\
         $ENTITY:transactions\n_id:2\nfrom_account_id:1\nfrom_amount:-200\n\
         to_account_id:0\nto_amount:0\ndatetime:{}\nupdated_on:0\n$$\n",
        DAY,
        2 * DAY
    )
}

#[test]
fn test_import_then_accounts_shows_recomputed_balance() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    let backup_path = home.path().join("data.backup");
    std::fs::write(&backup_path, sample_backup()).unwrap();

    expenses(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();

    expenses(home.path())
        .args(["import", backup_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restore complete."))
        .stdout(predicate::str::contains("1 accounts"));

    expenses(home.path())
        .arg("accounts")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking"))
        .stdout(predicate::str::contains("3.00 EUR"));
}

#[test]
fn test_import_missing_file_fails() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");

    expenses(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();

    expenses(home.path())
        .args(["import", "no-such-file.backup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_import_malformed_backup_fails() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    let backup_path = home.path().join("bad.backup");
    std::fs::write(&backup_path, "$ENTITY:account\n_id:abc\n$$\n").unwrap();

    expenses(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();

    expenses(home.path())
        .args(["import", backup_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for field '_id'"));
}
