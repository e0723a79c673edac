//! Fatal-error paths through the ubak binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[path = "../common/mod.rs"]
mod common;

use common::BackupFixture;

fn ubak() -> Command {
    Command::cargo_bin("ubak").expect("ubak binary builds")
}

#[test]
fn test_non_interactive_requires_sources() {
    ubak()
        .arg("--non-interactive")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No sources"));
}

#[test]
fn test_missing_source_is_fatal() {
    let fixture = BackupFixture::new();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path().join("no-such-user"))
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no-such-user"));
}

#[test]
fn test_source_that_is_a_file_is_fatal() {
    let fixture = BackupFixture::new();
    let file = fixture.profile.path().join("not-a-dir.txt");
    fs::write(&file, "plain file").unwrap();

    ubak()
        .arg("--source")
        .arg(&file)
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_unusable_destination_base_is_fatal() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();
    let blocked = fixture.dest.path().join("taken");
    fs::write(&blocked, "a file where the base dir should go").unwrap();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path())
        .arg("--dest")
        .arg(&blocked)
        .arg("--name")
        .arg("run")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_per_file_errors_do_not_fail_the_run() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let locked = fixture.profile.path().join("locked.dat");
        fs::write(&locked, "secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&locked).is_ok() {
            // Running as root; mode 000 does not make the file unreadable.
            return;
        }

        // Unreadable files are logged and counted, not fatal.
        ubak()
            .arg("--source")
            .arg(fixture.profile.path())
            .arg("--dest")
            .arg(fixture.dest.path())
            .arg("--name")
            .arg("partial")
            .assert()
            .success()
            .stdout(predicate::str::contains("error"));

        let log = fs::read_to_string(fixture.run_dir("partial").join("log.txt")).unwrap();
        assert!(log.contains("locked.dat"));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    }
}
