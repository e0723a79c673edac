//! Error types for userbackup.
//!
//! Only *fatal* conditions surface as [`Error`] values: failures that make the
//! whole backup impossible (unresolvable sources, uncreatable destination or
//! log file). Per-file and per-directory failures are branch-local by design;
//! they are reported through [`BackupLogger`](crate::BackupLogger) with
//! [`Severity::Error`](crate::Severity) and never unwind past their own
//! operation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for userbackup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a backup run.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No source roots were selected
    #[error("No source directories selected")]
    NoSources,

    /// A selected source root does not exist
    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// A selected source root is not a directory
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failed to create the destination root
    #[error("Failed to create destination directory {path}: {source}")]
    CreateDestination {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to open the backup log file
    #[error("Failed to open log file {path}: {source}")]
    OpenLog {
        /// Log file path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// `run` was called before a destination was selected
    #[error("No destination directory selected")]
    NoDestination,

    /// The run was cancelled via the cancel token
    #[error("Backup interrupted")]
    Interrupted,
}
