//! Browser bookmark collection.
//!
//! Cloud-sync and app-data folders are excluded from the recursive walk, but
//! browser bookmarks live inside them and are worth saving. Before each
//! profile root is walked, [`collect`] enqueues the well-known bookmark
//! files for the current platform directly into the task queue, using the
//! same enqueue contract as the walker. Any failure here is logged as an
//! error and never aborts the profile's walk.

use crate::logger::{BackupLogger, Severity};
use crate::queue::TaskQueue;
use crate::walker::DirectoryWalker;
use std::fs;
use std::path::Path;

/// A single well-known bookmark file, relative to the profile root.
struct BookmarkFile {
    label: &'static str,
    relative: &'static [&'static str],
    dest_dir: &'static str,
}

#[cfg(target_os = "macos")]
const BOOKMARK_FILES: &[BookmarkFile] = &[
    BookmarkFile {
        label: "Safari",
        relative: &["Library", "Safari", "Bookmarks.plist"],
        dest_dir: "SafariBookmarks",
    },
    BookmarkFile {
        label: "Chrome",
        relative: &[
            "Library",
            "Application Support",
            "Google",
            "Chrome",
            "Default",
            "Bookmarks",
        ],
        dest_dir: "ChromeBookmarks",
    },
];

#[cfg(windows)]
const BOOKMARK_FILES: &[BookmarkFile] = &[
    BookmarkFile {
        label: "Microsoft Edge",
        relative: &[
            "AppData", "Local", "Microsoft", "Edge", "User Data", "Default", "Bookmarks",
        ],
        dest_dir: "EdgeBookmarks",
    },
    BookmarkFile {
        label: "Chrome",
        relative: &[
            "AppData", "Local", "Google", "Chrome", "User Data", "Default", "Bookmarks",
        ],
        dest_dir: "ChromeBookmarks",
    },
];

#[cfg(not(any(target_os = "macos", windows)))]
const BOOKMARK_FILES: &[BookmarkFile] = &[
    BookmarkFile {
        label: "Chrome",
        relative: &[".config", "google-chrome", "Default", "Bookmarks"],
        dest_dir: "ChromeBookmarks",
    },
    BookmarkFile {
        label: "Chromium",
        relative: &[".config", "chromium", "Default", "Bookmarks"],
        dest_dir: "ChromiumBookmarks",
    },
];

/// Firefox keeps bookmarks inside per-profile directories; the whole
/// profiles tree is small and copied recursively.
#[cfg(target_os = "macos")]
const FIREFOX_PROFILES: &[&str] = &["Library", "Application Support", "Firefox", "Profiles"];
#[cfg(windows)]
const FIREFOX_PROFILES: &[&str] = &["AppData", "Roaming", "Mozilla", "Firefox", "Profiles"];
#[cfg(not(any(target_os = "macos", windows)))]
const FIREFOX_PROFILES: &[&str] = &[".mozilla", "firefox"];

/// Enqueue the platform's bookmark files for one profile root.
///
/// `user_dest` is the destination directory for this profile (it need not
/// exist yet; bookmark subdirectories are created as needed).
pub fn collect(
    user_root: &Path,
    user_dest: &Path,
    queue: &TaskQueue,
    logger: &BackupLogger,
    walker: &DirectoryWalker,
) {
    for bookmark in BOOKMARK_FILES {
        if let Err(e) = collect_file(user_root, user_dest, bookmark, queue) {
            logger.submit(
                &format!("ERROR processing {} bookmarks: {e}", bookmark.label),
                Severity::Error,
            );
        }
    }

    let profiles = join_all(user_root, FIREFOX_PROFILES);
    if profiles.is_dir() {
        let dest = user_dest.join("FirefoxBookmarks");
        match fs::create_dir_all(&dest) {
            Ok(()) => walker.walk_into(&profiles, &dest),
            Err(e) => logger.submit(
                &format!("ERROR processing Firefox bookmarks: {e}"),
                Severity::Error,
            ),
        }
    }
}

fn collect_file(
    user_root: &Path,
    user_dest: &Path,
    bookmark: &BookmarkFile,
    queue: &TaskQueue,
) -> std::io::Result<()> {
    let source = join_all(user_root, bookmark.relative);
    let meta = match fs::metadata(&source) {
        Ok(meta) if meta.is_file() => meta,
        // Browser not installed, or no bookmarks yet: nothing to do
        _ => return Ok(()),
    };
    let dest_dir = user_dest.join(bookmark.dest_dir);
    fs::create_dir_all(&dest_dir)?;
    let file_name = source.file_name().map_or_else(
        || std::ffi::OsString::from("Bookmarks"),
        std::ffi::OsStr::to_os_string,
    );
    queue.enqueue(source, dest_dir.join(file_name), meta.len());
    Ok(())
}

fn join_all(base: &Path, parts: &[&str]) -> std::path::PathBuf {
    let mut path = base.to_path_buf();
    for part in parts {
        path.push(part);
    }
    path
}
