//! Shared progress counters.
//!
//! One [`BackupCounters`] aggregate is shared by every component of the
//! pipeline. Copy-side counters are plain atomics. The scan-side pair
//! (`total_files`, `total_bytes`) lives behind its own narrow mutex so that
//! an enqueue updates both or neither: no reader can observe a file counted
//! without its bytes, or vice versa. No single lock guards the whole
//! aggregate, so a snapshot across copy-side and scan-side fields is
//! eventually consistent rather than linearizable, which is all the progress
//! reporter needs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The scan-side totals, updated as one unit per discovered file.
#[derive(Debug, Default, Clone, Copy)]
struct ScanTotals {
    files: u64,
    bytes: u64,
}

/// Process-wide progress counters, safe to update from any thread.
#[derive(Debug, Default)]
pub struct BackupCounters {
    copied_files: AtomicU64,
    copied_bytes: AtomicU64,
    error_count: AtomicU64,
    totals: Mutex<ScanTotals>,
}

/// A point-in-time view of the counters.
///
/// Copy-side and scan-side fields may be one tick out of sync with each
/// other; `total_files`/`total_bytes` are always mutually consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountersSnapshot {
    /// Files discovered so far
    pub total_files: u64,
    /// Bytes discovered so far
    pub total_bytes: u64,
    /// Files copied so far
    pub copied_files: u64,
    /// Bytes copied so far (sum of task sizes of successful copies)
    pub copied_bytes: u64,
    /// Errors logged so far
    pub error_count: u64,
}

impl BackupCounters {
    /// Create a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn totals(&self) -> MutexGuard<'_, ScanTotals> {
        // A poisoned totals lock would only mean a panicking enqueue; the
        // counts it holds are still the last consistent pair.
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one discovered file of `size` bytes.
    ///
    /// Both totals are bumped inside one critical section.
    pub fn record_discovered(&self, size: u64) {
        let mut totals = self.totals();
        totals.files += 1;
        totals.bytes += size;
    }

    /// Record one successfully copied file of `size` bytes.
    pub fn record_copied(&self, size: u64) {
        self.copied_files.fetch_add(1, Ordering::Relaxed);
        self.copied_bytes.fetch_add(size, Ordering::Relaxed);
    }

    /// Record one error.
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of files copied so far.
    pub fn copied_files(&self) -> u64 {
        self.copied_files.load(Ordering::Relaxed)
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> CountersSnapshot {
        let totals = *self.totals();
        CountersSnapshot {
            total_files: totals.files,
            total_bytes: totals.bytes,
            copied_files: self.copied_files.load(Ordering::Relaxed),
            copied_bytes: self.copied_bytes.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }
}
