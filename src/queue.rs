//! The shared copy-task queue.
//!
//! Multi-producer/multi-consumer, unbounded, non-blocking on the consumer
//! side: workers poll [`TaskQueue::try_dequeue`] and back off briefly when it
//! comes up empty instead of parking on a channel. Enqueuing a task also
//! records it in the discovery totals as one combined operation, so the
//! queue is the single point where "a file exists to be copied" becomes
//! visible to both workers and the progress reporter.

use crate::counters::BackupCounters;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One file to copy. Created by the walker (or a special-file collector),
/// consumed exactly once by exactly one worker, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    /// Absolute source path
    pub source: PathBuf,
    /// Absolute destination path
    pub dest: PathBuf,
    /// File size in bytes, as observed at discovery time
    pub size: u64,
}

/// Thread-safe queue of pending [`CopyTask`]s.
///
/// No ordering guarantee beyond "a task is visible to some dequeuer after
/// its enqueue completes"; no priority, no fairness.
#[derive(Debug)]
pub struct TaskQueue {
    inner: Mutex<VecDeque<CopyTask>>,
    counters: Arc<BackupCounters>,
}

impl TaskQueue {
    /// Create an empty queue that accumulates into `counters`.
    #[must_use]
    pub fn new(counters: Arc<BackupCounters>) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            counters,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CopyTask>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a task in the discovery totals, then append it.
    ///
    /// The totals update is a single critical section in
    /// [`BackupCounters::record_discovered`]: `total_files` and
    /// `total_bytes` move together, never one without the other. Totals go
    /// first: a task must not be dequeueable before it is counted, or a
    /// worker crediting the copy could push `copied_bytes` past
    /// `total_bytes`.
    pub fn enqueue(&self, source: PathBuf, dest: PathBuf, size: u64) {
        self.counters.record_discovered(size);
        self.lock().push_back(CopyTask { source, dest, size });
    }

    /// Remove and return a pending task, or `None` without blocking.
    pub fn try_dequeue(&self) -> Option<CopyTask> {
        self.lock().pop_front()
    }

    /// Whether the queue currently has no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drop all pending tasks. Used only on fatal abort so workers exit
    /// quickly; discovery totals are left as-is.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
