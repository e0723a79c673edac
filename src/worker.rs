//! The copy worker pool.
//!
//! Each worker is a long-lived thread draining the shared [`TaskQueue`]:
//! dequeue, copy the full file content, bump the counters, repeat. An empty
//! queue earns a short backoff sleep instead of a busy spin. Stopping is
//! cooperative and two-phase: [`WorkerPool::stop`] only raises a flag, and a
//! worker that sees it keeps draining until the queue reports empty at the
//! moment it checks, so no enqueued task is abandoned. A failed copy is
//! logged as an error and dropped; it is never retried or re-enqueued.

use crate::counters::BackupCounters;
use crate::fsutil;
use crate::logger::{BackupLogger, Severity};
use crate::queue::TaskQueue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Worker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// A fixed set of copy worker threads.
#[derive(Default)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Spawn `count` workers draining `queue`.
    #[must_use]
    pub fn start(
        count: usize,
        queue: Arc<TaskQueue>,
        counters: Arc<BackupCounters>,
        logger: Arc<BackupLogger>,
        backoff: Duration,
        preserve_timestamps: bool,
    ) -> Self {
        let workers = (0..count)
            .map(|id| {
                let stop = Arc::new(AtomicBool::new(false));
                let handle = {
                    let stop = stop.clone();
                    let queue = queue.clone();
                    let counters = counters.clone();
                    let logger = logger.clone();
                    thread::Builder::new()
                        .name(format!("copy-worker-{id}"))
                        .spawn(move || {
                            worker_loop(id, &stop, &queue, &counters, &logger, backoff, preserve_timestamps);
                        })
                };
                match handle {
                    Ok(handle) => Worker {
                        stop,
                        handle: Some(handle),
                    },
                    Err(e) => {
                        // A worker that never started is treated as already
                        // exited; the rest of the pool still drains the queue.
                        logger.submit(
                            &format!("ERROR spawning worker #{id}: {e}"),
                            Severity::Error,
                        );
                        Worker { stop, handle: None }
                    }
                }
            })
            .collect();
        Self { workers }
    }

    /// Number of pool slots.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Signal every worker to finish what is queued and exit. Idempotent;
    /// never interrupts a copy in progress.
    pub fn stop(&self) {
        for worker in &self.workers {
            worker.stop.store(true, Ordering::Release);
        }
    }

    /// Whether every worker thread has exited.
    pub fn all_finished(&self) -> bool {
        self.workers
            .iter()
            .all(|w| w.handle.as_ref().is_none_or(JoinHandle::is_finished))
    }

    /// Join all worker threads. Call after [`stop`](Self::stop).
    pub fn join(&mut self) {
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    tracing::error!("copy worker panicked");
                }
            }
        }
    }
}

fn worker_loop(
    id: usize,
    stop: &AtomicBool,
    queue: &TaskQueue,
    counters: &BackupCounters,
    logger: &BackupLogger,
    backoff: Duration,
    preserve_timestamps: bool,
) {
    tracing::debug!(worker = id, "worker starting");
    loop {
        if let Some(task) = queue.try_dequeue() {
            match fsutil::copy_file(&task.source, &task.dest, preserve_timestamps) {
                // The discovery-time size is what the totals counted, so it
                // is also what a successful copy credits.
                Ok(_) => counters.record_copied(task.size),
                Err(e) => logger.submit(
                    &format!(
                        "ERROR Worker #{id}: failed to copy {} -> {}: {e}",
                        task.source.display(),
                        task.dest.display()
                    ),
                    Severity::Error,
                ),
            }
        } else if stop.load(Ordering::Acquire) {
            // Queue empty at the moment of the check and stop signalled
            break;
        } else {
            thread::sleep(backoff);
        }
    }
    tracing::debug!(worker = id, "worker stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    const BACKOFF: Duration = Duration::from_millis(1);

    struct Rig {
        counters: Arc<BackupCounters>,
        queue: Arc<TaskQueue>,
        logger: Arc<BackupLogger>,
    }

    impl Rig {
        fn new() -> Self {
            let counters = Arc::new(BackupCounters::new());
            let queue = Arc::new(TaskQueue::new(counters.clone()));
            let logger = Arc::new(BackupLogger::new(counters.clone()));
            Self {
                counters,
                queue,
                logger,
            }
        }

        fn start_pool(&self, count: usize) -> WorkerPool {
            WorkerPool::start(
                count,
                self.queue.clone(),
                self.counters.clone(),
                self.logger.clone(),
                BACKOFF,
                false,
            )
        }
    }

    fn enqueue_files(rig: &Rig, dir: &Path, dest: &Path, specs: &[(&str, usize)]) {
        for (name, size) in specs {
            let src = dir.join(name);
            fs::write(&src, "x".repeat(*size)).unwrap();
            rig.queue.enqueue(src, dest.join(name), *size as u64);
        }
    }

    fn wait_until(pool: &WorkerPool, deadline: Duration) {
        let start = Instant::now();
        while !pool.all_finished() {
            assert!(start.elapsed() < deadline, "workers did not exit in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_drains_queue_even_when_stopped_up_front() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let rig = Rig::new();
        enqueue_files(
            &rig,
            src.path(),
            dst.path(),
            &[("a", 10), ("b", 20), ("c", 30), ("d", 5)],
        );

        let mut pool = rig.start_pool(2);
        // Stop is "finish what's there, then exit", not "cancel in place":
        // everything already queued must still be copied.
        pool.stop();
        wait_until(&pool, Duration::from_secs(10));
        pool.join();

        assert!(rig.queue.is_empty());
        let snap = rig.counters.snapshot();
        assert_eq!(snap.copied_files, 4);
        assert_eq!(snap.copied_bytes, 65);
        assert_eq!(snap.error_count, 0);
        for name in ["a", "b", "c", "d"] {
            assert!(dst.path().join(name).exists());
        }
    }

    #[test]
    fn test_stop_is_idempotent() {
        let rig = Rig::new();
        let mut pool = rig.start_pool(3);
        pool.stop();
        pool.stop();
        wait_until(&pool, Duration::from_secs(5));
        pool.join();
        assert!(pool.all_finished());
    }

    #[test]
    fn test_failed_copy_is_counted_not_retried() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let rig = Rig::new();
        enqueue_files(
            &rig,
            src.path(),
            dst.path(),
            &[("a", 1), ("b", 2), ("c", 3), ("d", 4)],
        );
        // Fifth file vanishes between discovery and copy
        rig.queue.enqueue(
            src.path().join("ghost"),
            dst.path().join("ghost"),
            7,
        );

        let mut pool = rig.start_pool(4);
        pool.stop();
        wait_until(&pool, Duration::from_secs(10));
        pool.join();

        let snap = rig.counters.snapshot();
        assert_eq!(snap.total_files, 5);
        assert_eq!(snap.copied_files, 4);
        assert_eq!(snap.error_count, 1);
        // Failed copies never contribute to copied bytes
        assert_eq!(snap.copied_bytes, 10);
        assert!(rig.queue.is_empty(), "failed task is not re-enqueued");
    }

    #[test]
    fn test_workers_pick_up_late_enqueues_before_stop() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let rig = Rig::new();

        let mut pool = rig.start_pool(2);
        // Workers idle on an empty queue, then work arrives
        thread::sleep(Duration::from_millis(20));
        enqueue_files(&rig, src.path(), dst.path(), &[("late", 8)]);

        // Drain before signalling, as the orchestrator does
        let start = Instant::now();
        while !rig.queue.is_empty() {
            assert!(start.elapsed() < Duration::from_secs(10));
            thread::sleep(Duration::from_millis(5));
        }
        pool.stop();
        wait_until(&pool, Duration::from_secs(10));
        pool.join();

        assert_eq!(rig.counters.copied_files(), 1);
        assert!(dst.path().join("late").exists());
    }
}
