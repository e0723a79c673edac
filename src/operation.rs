//! The backup orchestrator.
//!
//! [`BackupOperation`] owns the lifecycle of every pipeline component and is
//! the only thing that starts or stops them. A run moves through the phases
//! of [`BackupPhase`] in order; any fatal error drops it into
//! [`BackupPhase::Aborted`], which clears the queue and stops workers
//! without waiting for a drain. Shutdown on the happy path is two-phase:
//! stop producing and wait for the queue to empty, then signal the workers
//! and wait for their threads to exit. Only then are the totals final and
//! the summary written.

use crate::bookmarks;
use crate::counters::BackupCounters;
use crate::error::{Error, Result};
use crate::logger::{BackupLogger, Severity};
use crate::options::BackupOptions;
use crate::queue::TaskQueue;
use crate::reporter::ProgressReporter;
use crate::walker::DirectoryWalker;
use crate::worker::WorkerPool;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Lifecycle phase of a backup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupPhase {
    /// Nothing selected yet
    Idle,
    /// Source roots validated
    SourceSelected,
    /// Destination root created
    DestSelected,
    /// Walking source trees, workers copying
    Scanning,
    /// Discovery finished, waiting for the queue to empty
    Draining,
    /// Queue empty, waiting for worker threads to exit
    WorkersStopping,
    /// Run finished; summary written
    Completed,
    /// Fatal error; pending work discarded
    Aborted,
}

/// Final accounting for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    /// Files discovered
    pub total_files: u64,
    /// Files copied
    pub copied_files: u64,
    /// Bytes discovered
    pub total_bytes: u64,
    /// Bytes copied
    pub copied_bytes: u64,
    /// Errors logged
    pub error_count: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// The run's destination root
    pub destination: PathBuf,
}

/// Orchestrates one backup run end to end.
pub struct BackupOperation {
    options: BackupOptions,
    counters: Arc<BackupCounters>,
    queue: Arc<TaskQueue>,
    logger: Arc<BackupLogger>,
    scan_completed: Arc<AtomicBool>,
    sources: Vec<PathBuf>,
    dest: Option<PathBuf>,
    phase: BackupPhase,
    pool: Option<WorkerPool>,
    reporter: Option<ProgressReporter>,
}

impl BackupOperation {
    /// Create an idle operation.
    #[must_use]
    pub fn new(options: BackupOptions) -> Self {
        let counters = Arc::new(BackupCounters::new());
        let queue = Arc::new(TaskQueue::new(counters.clone()));
        let logger = Arc::new(BackupLogger::new(counters.clone()));
        Self {
            options,
            counters,
            queue,
            logger,
            scan_completed: Arc::new(AtomicBool::new(false)),
            sources: Vec::new(),
            dest: None,
            phase: BackupPhase::Idle,
            pool: None,
            reporter: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> BackupPhase {
        self.phase
    }

    /// Shared counters handle, for external observers.
    pub fn counters(&self) -> Arc<BackupCounters> {
        self.counters.clone()
    }

    /// Validate and adopt the source roots.
    pub fn select_sources(&mut self, sources: Vec<PathBuf>) -> Result<()> {
        let result = Self::validate_sources(&sources);
        match result {
            Ok(()) => {
                self.sources = sources;
                self.phase = BackupPhase::SourceSelected;
                Ok(())
            }
            Err(e) => {
                self.phase = BackupPhase::Aborted;
                Err(e)
            }
        }
    }

    fn validate_sources(sources: &[PathBuf]) -> Result<()> {
        if sources.is_empty() {
            return Err(Error::NoSources);
        }
        for source in sources {
            let meta = fs::metadata(source)
                .map_err(|_| Error::SourceNotFound(source.clone()))?;
            if !meta.is_dir() {
                return Err(Error::NotADirectory(source.clone()));
            }
        }
        Ok(())
    }

    /// Create a unique run directory `base/<name>` and adopt it as the
    /// destination root. An existing directory of that name gets a
    /// timestamp suffix instead of being reused.
    pub fn select_destination(&mut self, base: &Path, name: &str) -> Result<PathBuf> {
        match Self::create_run_dir(base, name) {
            Ok(dest) => {
                self.dest = Some(dest.clone());
                self.phase = BackupPhase::DestSelected;
                Ok(dest)
            }
            Err(e) => {
                self.phase = BackupPhase::Aborted;
                Err(e)
            }
        }
    }

    fn create_run_dir(base: &Path, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(base).map_err(|source| Error::CreateDestination {
            path: base.to_path_buf(),
            source,
        })?;
        // Backup names come from user input; path separators would escape base
        let name: String = name
            .chars()
            .filter(|c| !std::path::is_separator(*c))
            .collect();
        let mut dest = base.join(&name);
        if dest.exists() {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            dest = base.join(format!("{name}_{stamp}"));
        }
        fs::create_dir(&dest).map_err(|source| Error::CreateDestination {
            path: dest.clone(),
            source,
        })?;
        Ok(dest)
    }

    /// Run the backup to completion (or fatal abort).
    ///
    /// On success the run ends in [`BackupPhase::Completed`] with a full
    /// summary; per-file errors do not fail the run. On a fatal error the
    /// run ends in [`BackupPhase::Aborted`] with pending tasks discarded.
    pub fn run(&mut self) -> Result<BackupSummary> {
        match self.execute() {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.abort(&e);
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<BackupSummary> {
        let dest = self.dest.clone().ok_or(Error::NoDestination)?;
        if self.sources.is_empty() {
            return Err(Error::NoSources);
        }

        self.logger.open(&dest.join("log.txt"))?;
        let started = Instant::now();
        self.logger.submit(
            &format!(
                "** userbackup v{}, starting backup to {}",
                env!("CARGO_PKG_VERSION"),
                dest.display()
            ),
            Severity::Normal,
        );

        self.pool = Some(WorkerPool::start(
            self.options.workers,
            self.queue.clone(),
            self.counters.clone(),
            self.logger.clone(),
            self.options.worker_backoff,
            self.options.preserve_timestamps,
        ));
        self.reporter = Some(ProgressReporter::start(
            self.counters.clone(),
            self.scan_completed.clone(),
            self.options.progress_interval,
        ));

        self.phase = BackupPhase::Scanning;
        tracing::info!(phase = ?self.phase, sources = self.sources.len(), "scan starting");
        let walker = DirectoryWalker::new(
            dest.clone(),
            self.queue.clone(),
            self.logger.clone(),
            self.options.clone(),
        );
        let sources = self.sources.clone();
        for root in &sources {
            if self.options.is_cancelled() {
                return Err(Error::Interrupted);
            }
            let user_name = root
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("root"))
                .to_string_lossy()
                .into_owned();
            self.logger
                .submit(&format!("** Scanning user '{user_name}'"), Severity::Normal);
            bookmarks::collect(
                root,
                &dest.join(&user_name),
                &self.queue,
                &self.logger,
                &walker,
            );
            walker.walk_root(root);
        }

        self.logger.submit(
            "** Backup scan completed! Waiting for queue to be completed by worker threads...",
            Severity::Normal,
        );
        self.phase = BackupPhase::Draining;
        self.scan_completed.store(true, Ordering::Release);
        while !self.queue.is_empty() {
            if self.options.is_cancelled() {
                return Err(Error::Interrupted);
            }
            thread::sleep(self.options.drain_poll);
        }

        self.logger.submit(
            "** Queue has been completed! Signalling worker threads to wrap up once finished...",
            Severity::Normal,
        );
        self.phase = BackupPhase::WorkersStopping;
        if let Some(pool) = self.pool.as_mut() {
            pool.stop();
            while !pool.all_finished() {
                thread::sleep(self.options.drain_poll);
            }
            pool.join();
        }
        self.pool = None;

        if let Some(reporter) = self.reporter.take() {
            reporter.stop();
        }

        let snap = self.counters.snapshot();
        let summary = BackupSummary {
            total_files: snap.total_files,
            copied_files: snap.copied_files,
            total_bytes: snap.total_bytes,
            copied_bytes: snap.copied_bytes,
            error_count: snap.error_count,
            duration: started.elapsed(),
            destination: dest.clone(),
        };
        self.logger.submit(
            &format!(
                "** Backup completed to {}\nTotal files backed up: {} of {}\nBackup size: {} MB\nError count: {}\nDuration: {}",
                dest.display(),
                summary.copied_files,
                summary.total_files,
                summary.copied_bytes / 1_000_000,
                summary.error_count,
                format_duration(summary.duration)
            ),
            Severity::Normal,
        );
        self.phase = BackupPhase::Completed;
        self.logger.close();
        Ok(summary)
    }

    /// Fatal-abort path: stop reporting, log the failure, discard pending
    /// work and stop workers without waiting for a drain.
    fn abort(&mut self, error: &Error) {
        self.phase = BackupPhase::Aborted;
        if let Some(reporter) = self.reporter.take() {
            reporter.stop();
        }
        self.logger.submit(
            &format!(
                "***FATAL ERROR*** on backup{}: {error}",
                self.dest
                    .as_deref()
                    .map(|d| format!(" {}", d.display()))
                    .unwrap_or_default()
            ),
            Severity::Error,
        );
        self.queue.clear();
        if let Some(mut pool) = self.pool.take() {
            pool.stop();
            pool.join();
        }
        self.logger.close();
    }
}

/// Human duration like `2 Hours 3 Minutes 4 Seconds`, falling back to
/// milliseconds for sub-minute runs.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = duration.subsec_millis();

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours} Hours"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} Minutes"));
    }
    if seconds > 0 {
        parts.push(format!("{seconds} Seconds"));
    }
    if hours == 0 && minutes == 0 {
        parts.push(format!("{millis} Milliseconds"));
    }
    parts.join(" ")
}
