//! Configuration options for backup runs.
//!
//! This module provides [`BackupOptions`] for configuring the pipeline:
//! worker count, exclusion policy, timing intervals.
//!
//! # Example
//!
//! ```
//! use userbackup::BackupOptions;
//!
//! let options = BackupOptions::default()
//!     .with_workers(8)
//!     .without_timestamps();
//! ```

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Directory names excluded at the root of every user profile.
///
/// Cloud-sync folders, app data and OS library folders: large, volatile,
/// and restorable from elsewhere. Matched case-insensitively, root level only.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "Library",
    "Applications",
    "AppData",
    "Dropbox",
    "Box",
    "Box Sync",
    "OneDrive",
    "Google Drive",
];

/// Options for a backup run.
///
/// Use [`Default::default()`] to get sensible defaults, then customize
/// using the builder methods.
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `workers` | 16 | Copy worker threads |
/// | `excluded_root_dirs` | [`DEFAULT_EXCLUDED_DIRS`] | Skipped at profile root |
/// | `bundle_suffixes` | `[".app"]` | Bundle directories skipped at profile root |
/// | `progress_interval` | 5s | Progress report cadence |
/// | `drain_poll` | 50ms | Drain/join poll interval |
/// | `worker_backoff` | 1ms | Worker sleep when the queue is empty |
/// | `preserve_timestamps` | `true` | Copy file mtimes |
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Number of copy worker threads (default: 16)
    pub workers: usize,

    /// Directory names skipped at the root level of each user profile
    pub excluded_root_dirs: Vec<String>,

    /// Directory name suffixes treated as application bundles (default: `.app`)
    pub bundle_suffixes: Vec<String>,

    /// How often the progress reporter renders a line (default: 5s)
    pub progress_interval: Duration,

    /// Poll interval for the drain and worker-exit waits (default: 50ms)
    pub drain_poll: Duration,

    /// Worker backoff when no task is available (default: 1ms)
    pub worker_backoff: Duration,

    /// Whether copied files keep the source modification time (default: true)
    pub preserve_timestamps: bool,

    /// Cancellation token (optional)
    ///
    /// When set to `true` the orchestrator aborts the run: pending tasks are
    /// cleared and workers stop without waiting for the queue to drain.
    /// A copy already in progress runs to completion.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            workers: 16,
            excluded_root_dirs: DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            bundle_suffixes: vec![".app".to_owned()],
            progress_interval: Duration::from_secs(5),
            drain_poll: Duration::from_millis(50),
            worker_backoff: Duration::from_millis(1),
            preserve_timestamps: true,
            cancel: None,
        }
    }
}

impl BackupOptions {
    /// Set the number of copy worker threads.
    ///
    /// Value is clamped to at least 1.
    #[must_use]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }

    /// Replace the root-level exclusion list.
    #[must_use]
    pub fn with_excluded_root_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_root_dirs = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the bundle suffix list.
    #[must_use]
    pub fn with_bundle_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bundle_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the progress report interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the poll interval used while draining the queue and waiting for
    /// workers to exit.
    #[must_use]
    pub fn with_drain_poll(mut self, interval: Duration) -> Self {
        self.drain_poll = interval;
        self
    }

    /// Disable modification-time preservation on copied files.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.preserve_timestamps = false;
        self
    }

    /// Attach a cancellation token checked by the orchestrator and walker.
    #[must_use]
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|t| t.load(std::sync::atomic::Ordering::Relaxed))
    }
}
