//! Common test utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test fixture providing a fake user profile and a destination base.
pub struct BackupFixture {
    pub profile: TempDir,
    pub dest: TempDir,
}

impl BackupFixture {
    /// Create a fixture with empty profile and destination directories.
    pub fn new() -> Self {
        Self {
            profile: TempDir::new().expect("Failed to create temp profile dir"),
            dest: TempDir::new().expect("Failed to create temp dest dir"),
        }
    }

    /// Populate the profile with a realistic layout: visible documents,
    /// an excluded `AppData` folder, and a hidden dot-file.
    pub fn populate_profile(&self) {
        let root = self.profile.path();
        fs::create_dir_all(root.join("Documents/projects")).expect("Failed to create dirs");
        fs::write(root.join("Documents/notes.txt"), "meeting notes").expect("write");
        fs::write(root.join("Documents/projects/plan.md"), "# plan").expect("write");
        fs::write(root.join("resume.pdf"), "pdf bytes").expect("write");

        fs::create_dir_all(root.join("AppData/Local")).expect("Failed to create dirs");
        fs::write(root.join("AppData/Local/cache.bin"), "cache").expect("write");

        fs::write(root.join(".bash_history"), "ls").expect("write");
    }

    /// Name of the profile directory, as it appears under the run directory.
    pub fn profile_name(&self) -> String {
        self.profile
            .path()
            .file_name()
            .expect("profile has a name")
            .to_string_lossy()
            .into_owned()
    }

    /// The run directory for a backup named `name`.
    pub fn run_dir(&self, name: &str) -> PathBuf {
        self.dest.path().join(name)
    }
}

impl Default for BackupFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Count all files in a directory recursively.
pub fn count_files_recursive(dir: &Path) -> usize {
    let mut count = 0;
    if dir.is_dir() {
        for entry in fs::read_dir(dir).expect("Failed to read directory") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                count += count_files_recursive(&path);
            } else {
                count += 1;
            }
        }
    }
    count
}
