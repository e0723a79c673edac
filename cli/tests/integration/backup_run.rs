//! End-to-end backup runs through the ubak binary.

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
fn test_backup_mirrors_profile() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path())
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("run1")
        .arg("--threads")
        .arg("4")
        .assert()
        .success();

    let mirrored = fixture.run_dir("run1").join(fixture.profile_name());
    assert_eq!(
        fs::read_to_string(mirrored.join("Documents/notes.txt")).unwrap(),
        "meeting notes"
    );
    assert_eq!(
        fs::read_to_string(mirrored.join("Documents/projects/plan.md")).unwrap(),
        "# plan"
    );
    assert_eq!(
        fs::read_to_string(mirrored.join("resume.pdf")).unwrap(),
        "pdf bytes"
    );
}

#[test]
fn test_backup_writes_log_file() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path())
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("logged")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup completed"));

    let log = fs::read_to_string(fixture.run_dir("logged").join("log.txt")).unwrap();
    assert!(log.contains("starting backup"));
    assert!(log.contains("Backup completed"));
}

#[test]
fn test_excluded_and_hidden_entries_skipped() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path())
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("filtered")
        .assert()
        .success();

    let mirrored = fixture.run_dir("filtered").join(fixture.profile_name());
    assert!(mirrored.join("Documents").is_dir());
    assert!(!mirrored.join("AppData").exists());
    assert!(!mirrored.join(".bash_history").exists());
}

#[cfg(not(any(target_os = "macos", windows)))]
#[test]
fn test_chrome_bookmarks_collected() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();
    let chrome = fixture.profile.path().join(".config/google-chrome/Default");
    fs::create_dir_all(&chrome).unwrap();
    fs::write(chrome.join("Bookmarks"), "{\"roots\":{}}").unwrap();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path())
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("marks")
        .assert()
        .success();

    let bookmarks = fixture
        .run_dir("marks")
        .join(fixture.profile_name())
        .join("ChromeBookmarks/Bookmarks");
    assert_eq!(fs::read_to_string(bookmarks).unwrap(), "{\"roots\":{}}");
}

#[test]
fn test_repeat_runs_get_unique_directories() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();

    for _ in 0..2 {
        ubak()
            .arg("--source")
            .arg(fixture.profile.path())
            .arg("--dest")
            .arg(fixture.dest.path())
            .arg("--name")
            .arg("same-name")
            .assert()
            .success();
    }

    let runs = fs::read_dir(fixture.dest.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .count();
    assert_eq!(runs, 2, "second run must not reuse the first run directory");
}

#[test]
fn test_backup_of_two_profiles() {
    let fixture = BackupFixture::new();
    fixture.populate_profile();
    let other = tempfile::TempDir::new().unwrap();
    fs::write(other.path().join("todo.txt"), "todo").unwrap();

    ubak()
        .arg("--source")
        .arg(fixture.profile.path())
        .arg("--source")
        .arg(other.path())
        .arg("--dest")
        .arg(fixture.dest.path())
        .arg("--name")
        .arg("pair")
        .assert()
        .success();

    let run = fixture.run_dir("pair");
    assert!(run.join(fixture.profile_name()).is_dir());
    let other_name = other.path().file_name().unwrap();
    assert_eq!(
        fs::read_to_string(run.join(other_name).join("todo.txt")).unwrap(),
        "todo"
    );
    assert!(common::count_files_recursive(&run) >= 5);
}
