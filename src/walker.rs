//! Directory discovery.
//!
//! [`DirectoryWalker`] recursively walks a user-profile tree, mirrors each
//! directory under the destination root *before* any file beneath it is
//! enqueued (so no worker ever races a missing directory), and feeds the
//! [`TaskQueue`]. Subdirectories of one level fan out onto rayon scope
//! tasks; file discovery within a level stays sequential. The fan-out is
//! bounded by the shape of the tree, not by an explicit pool.
//!
//! Failures are branch-local: a directory that cannot be mirrored or
//! enumerated is logged and skipped, and its siblings are unaffected.

use crate::fsutil;
use crate::logger::{BackupLogger, Severity};
use crate::options::BackupOptions;
use crate::queue::TaskQueue;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recursive, fan-out directory walker.
#[derive(Debug)]
pub struct DirectoryWalker {
    dest_root: PathBuf,
    queue: Arc<TaskQueue>,
    logger: Arc<BackupLogger>,
    options: BackupOptions,
}

impl DirectoryWalker {
    /// Create a walker that mirrors into `dest_root`.
    #[must_use]
    pub fn new(
        dest_root: PathBuf,
        queue: Arc<TaskQueue>,
        logger: Arc<BackupLogger>,
        options: BackupOptions,
    ) -> Self {
        Self {
            dest_root,
            queue,
            logger,
            options,
        }
    }

    /// Walk a user-profile root. Root-level exclusion policy applies to the
    /// immediate children of `source_root`.
    pub fn walk_root(&self, source_root: &Path) {
        rayon::scope(|scope| {
            self.walk_dir(
                scope,
                source_root.to_path_buf(),
                self.dest_root.clone(),
                true,
            );
        });
    }

    /// Walk an arbitrary directory into `dest_parent`, without root-level
    /// exclusions. Used by the special-file collectors.
    pub fn walk_into(&self, dir: &Path, dest_parent: &Path) {
        rayon::scope(|scope| {
            self.walk_dir(scope, dir.to_path_buf(), dest_parent.to_path_buf(), false);
        });
    }

    fn walk_dir<'s>(
        &'s self,
        scope: &rayon::Scope<'s>,
        dir: PathBuf,
        dest_parent: PathBuf,
        is_root: bool,
    ) {
        if self.options.is_cancelled() {
            return;
        }

        // Loop protection: the destination nested somewhere inside a source
        // tree would otherwise be backed up into itself forever.
        if path_contains(&dir, &self.dest_root) {
            tracing::warn!(dir = %dir.display(), "backup loop detected");
            self.logger.submit(
                &format!(
                    "WARNING - Backup loop detected! Skipping folder {}",
                    dir.display()
                ),
                Severity::Normal,
            );
            return;
        }

        let name = dir.file_name().unwrap_or_else(|| OsStr::new("root"));
        let dest = dest_parent.join(name);
        if let Err(e) = fs::create_dir_all(&dest) {
            self.logger.submit(
                &format!(
                    "ERROR creating destination directory {}: {e}",
                    dest.display()
                ),
                Severity::Error,
            );
            return;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.logger.submit(
                    &format!("ERROR enumerating directory {}: {e}", dir.display()),
                    Severity::Error,
                );
                return;
            }
        };

        let mut subdirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.logger.submit(
                        &format!("ERROR reading entry in {}: {e}", dir.display()),
                        Severity::Error,
                    );
                    continue;
                }
            };
            let entry_name = entry.file_name();
            // DirEntry::metadata does not traverse symlinks
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    self.logger.submit(
                        &format!("ERROR processing {}: {e}", entry.path().display()),
                        Severity::Error,
                    );
                    continue;
                }
            };

            if fsutil::is_hidden(&entry_name, &meta) {
                continue;
            }

            let file_type = meta.file_type();
            if file_type.is_file() {
                self.queue
                    .enqueue(entry.path(), dest.join(&entry_name), meta.len());
            } else if file_type.is_dir() {
                if is_root && self.is_excluded_root_dir(&entry_name) {
                    continue;
                }
                subdirs.push(entry.path());
            }
            // Symlinks and special files are not backed up
        }

        for sub in subdirs {
            let sub_dest = dest.clone();
            scope.spawn(move |scope| self.walk_dir(scope, sub, sub_dest, false));
        }
    }

    fn is_excluded_root_dir(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            return true;
        }
        let lower = name.to_lowercase();
        if self
            .options
            .bundle_suffixes
            .iter()
            .any(|suffix| lower.ends_with(&suffix.to_lowercase()))
        {
            return true;
        }
        self.options
            .excluded_root_dirs
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&name))
    }
}

/// Lexical containment check for loop protection. Case-insensitive on the
/// platforms whose default filesystems are.
fn path_contains(dir: &Path, dest: &Path) -> bool {
    let hay = dir.to_string_lossy();
    let needle = dest.to_string_lossy();
    if cfg!(any(windows, target_os = "macos")) {
        hay.to_lowercase().contains(&needle.to_lowercase())
    } else {
        hay.contains(needle.as_ref())
    }
}
