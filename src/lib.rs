//! # userbackup
//!
//! Concurrent user-profile backup: walk one or more profile trees, copy
//! their contents to a destination root, and report progress while doing so
//! across a pool of worker threads.
//!
//! ## Pipeline
//!
//! - **Walker**: discovers files, mirrors directories eagerly, applies the
//!   root-level exclusion policy, and enqueues copy tasks
//! - **Task queue**: thread-safe, unbounded; enqueuing also records the file
//!   in the discovery totals as one combined operation
//! - **Worker pool**: fixed number of threads draining the queue with a
//!   cooperative "finish what's there, then exit" stop
//! - **Progress reporter**: timer thread rendering a counters snapshot every
//!   few seconds
//! - **Orchestrator**: [`BackupOperation`] sequences walk → drain → worker
//!   shutdown → final summary, and owns every component's lifecycle
//!
//! Data flows one direction: walker → queue → workers → counters, with the
//! reporter reading counters only. Every discovered file is copied exactly
//! once or has its failure logged; the run terminates deterministically once
//! scanning and copying are both finished.
//!
//! ## Quick Start
//!
//! ```no_run
//! use userbackup::{BackupOperation, BackupOptions};
//! use std::path::Path;
//!
//! let mut op = BackupOperation::new(BackupOptions::default().with_workers(8));
//! op.select_sources(vec!["/home/alice".into()])?;
//! op.select_destination(Path::new("/mnt/usb/Backups"), "alice-laptop")?;
//! let summary = op.run()?;
//! println!(
//!     "{} of {} files copied, {} errors",
//!     summary.copied_files, summary.total_files, summary.error_count
//! );
//! # Ok::<(), userbackup::Error>(())
//! ```
//!
//! ## Error model
//!
//! Fatal errors (unresolvable sources, uncreatable destination or log file)
//! abort the run. Everything per-file or per-directory is branch-local: it
//! is written to the backup log with [`Severity::Error`], counted, and the
//! rest of the tree carries on. A completed run can therefore report a
//! nonzero error count, and that is still a success exit.

mod bookmarks;
mod counters;
mod error;
mod fsutil;
mod logger;
mod operation;
mod options;
mod queue;
mod reporter;
mod walker;
mod worker;

pub use counters::{BackupCounters, CountersSnapshot};
pub use error::{Error, Result};
pub use logger::{BackupLogger, Severity};
pub use operation::{BackupOperation, BackupPhase, BackupSummary};
pub use options::{BackupOptions, DEFAULT_EXCLUDED_DIRS};
pub use queue::{CopyTask, TaskQueue};
pub use reporter::ProgressReporter;
pub use walker::DirectoryWalker;
pub use worker::WorkerPool;
