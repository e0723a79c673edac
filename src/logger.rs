//! The backup log.
//!
//! [`BackupLogger`] appends one `"<timestamp>: <message>"` line per entry to
//! a `log.txt` in the destination root, flushing on every write, and echoes
//! the entry to the console. It is safe to call from any thread and never
//! propagates its own failures back into the pipeline: a write error goes to
//! stderr and the backup carries on.
//!
//! Submitting with [`Severity::Error`] increments the shared error counter
//! exactly once as a side effect; this is the single accounting point for
//! branch-local failures anywhere in the pipeline.

use crate::counters::BackupCounters;
use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Informational entry
    #[default]
    Normal,
    /// Failure entry; bumps the shared error counter
    Error,
}

/// Append-only, flush-per-write backup log.
#[derive(Debug)]
pub struct BackupLogger {
    counters: Arc<BackupCounters>,
    file: Mutex<Option<File>>,
}

impl BackupLogger {
    /// Create a logger with no file attached yet. Entries submitted before
    /// [`open`](Self::open) reach the console only.
    #[must_use]
    pub fn new(counters: Arc<BackupCounters>) -> Self {
        Self {
            counters,
            file: Mutex::new(None),
        }
    }

    fn file(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open (or create) the log file in append mode.
    pub fn open(&self, path: &Path) -> Result<()> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::OpenLog {
                path: path.to_path_buf(),
                source,
            })?;
        *self.file() = Some(log);
        println!("Opened logfile at {}", path.display());
        Ok(())
    }

    /// Write an entry to the log and echo it to the console.
    ///
    /// An [`Severity::Error`] entry increments the error counter exactly
    /// once, whether or not the file write succeeds.
    pub fn submit(&self, entry: &str, severity: Severity) {
        println!("{entry}");
        {
            let mut file = self.file();
            if let Some(file) = file.as_mut() {
                let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                if let Err(e) = writeln!(file, "{stamp}: {entry}").and_then(|()| file.flush()) {
                    eprintln!("ERROR writing to logfile: {e}");
                }
            }
        }
        if severity == Severity::Error {
            tracing::warn!(entry, "backup error logged");
            self.counters.record_error();
        }
    }

    /// Detach and close the log file. Entries submitted afterwards reach the
    /// console only.
    pub fn close(&self) {
        if let Some(file) = self.file().take() {
            drop(file);
        }
    }
}
