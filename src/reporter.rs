//! Periodic progress reporting.
//!
//! [`ProgressReporter`] owns a timer thread that renders a counters snapshot
//! on a fixed interval. While discovery is still running it shows both
//! denominators growing; once the scan-completed flag flips it adds an
//! integer percent-complete figure. Reporting is best-effort: it reads
//! whatever the counters hold at that instant and can never block or crash
//! the pipeline.

use crate::counters::{BackupCounters, CountersSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Timer-driven progress line printer.
pub struct ProgressReporter {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Spawn the reporter thread.
    ///
    /// `scan_completed` is written once by the orchestrator after the last
    /// root has been walked; it only ever transitions false to true.
    #[must_use]
    pub fn start(
        counters: Arc<BackupCounters>,
        scan_completed: Arc<AtomicBool>,
        interval: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("progress-reporter".to_owned())
                .spawn(move || {
                    while !sleep_interruptibly(&stop, interval) {
                        let line = render_line(
                            counters.snapshot(),
                            scan_completed.load(Ordering::Acquire),
                        );
                        println!("{line}");
                    }
                })
                .ok()
        };
        Self { stop, handle }
    }

    /// Stop the reporter and join its thread.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("progress reporter panicked");
            }
        }
    }
}

/// Sleep for `interval` in short slices; returns true if stopped meanwhile.
fn sleep_interruptibly(stop: &AtomicBool, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    while Instant::now() < deadline {
        if stop.load(Ordering::Acquire) {
            return true;
        }
        thread::sleep(Duration::from_millis(25).min(interval));
    }
    stop.load(Ordering::Acquire)
}

/// Render one progress line from a snapshot.
fn render_line(snap: CountersSnapshot, scan_completed: bool) -> String {
    let copied_mb = snap.copied_bytes / 1_000_000;
    let total_mb = snap.total_bytes / 1_000_000;
    if scan_completed {
        let pct = percent_complete(snap.copied_bytes, snap.total_bytes);
        format!(
            "** {pct}% COMPLETE - {} of {} files copied ({copied_mb} of {total_mb} MB)",
            snap.copied_files, snap.total_files
        )
    } else {
        format!(
            "** SCANNING - {} of {} files copied ({copied_mb} of {total_mb} MB)",
            snap.copied_files, snap.total_files
        )
    }
}

/// Integer (round-down) percent, with an empty backup counting as done.
fn percent_complete(copied_bytes: u64, total_bytes: u64) -> u64 {
    if total_bytes == 0 {
        100
    } else {
        copied_bytes * 100 / total_bytes
    }
}
