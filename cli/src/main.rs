//! ubak - user-profile backup
//!
//! Interactive (or flag-driven) front end for the userbackup pipeline:
//! pick user profiles, pick a destination, run the backup, exit 0 on a
//! completed run even when individual files failed.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use userbackup::{BackupOperation, BackupOptions, BackupSummary};

mod discover;

/// ubak - back up user profiles to a destination folder
///
/// With no flags, scans the machine for user-profile directories and asks
/// which ones to back up. With --source, runs without prompting.
#[derive(Parser, Debug)]
#[command(name = "ubak", version, about, long_about = None)]
struct Args {
    /// Source profile directory (repeatable; skips the interactive prompt)
    #[arg(short = 's', long = "source", value_name = "DIR")]
    sources: Vec<PathBuf>,

    /// Destination base directory (default: ./Backups)
    #[arg(short = 'd', long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Backup name; the run directory is <dest>/<name> (default: hostname)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Number of copy worker threads
    #[arg(short = 't', long, default_value = "16")]
    threads: usize,

    /// Never prompt; fail if sources are not given
    #[arg(long)]
    non_interactive: bool,

    /// Do not preserve file modification times
    #[arg(long)]
    no_times: bool,
}

type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
enum CliError {
    #[error("No sources given; pass --source or run without --non-interactive")]
    NoSources,

    #[error("No user-profile directories detected on this machine")]
    NoUsersDetected,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to read input: {0}")]
    ReadInput(#[source] io::Error),

    #[error(transparent)]
    Backup(#[from] userbackup::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::NoSources | Self::InvalidSelection(_) => 2,
            Self::NoUsersDetected | Self::ReadInput(_) | Self::Backup(_) => 1,
        }
    }
}

fn main() {
    let args = Args::parse();
    let interactive = args.sources.is_empty() && !args.non_interactive;

    match run(args) {
        Ok(summary) => {
            if summary.error_count > 0 {
                println!(
                    "Backup finished with {} error(s); see the log in {}",
                    summary.error_count,
                    summary.destination.display()
                );
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            if interactive {
                wait_for_ack();
            }
            std::process::exit(error.exit_code());
        }
    }
}

fn run(args: Args) -> CliResult<BackupSummary> {
    init_tracing();

    let interactive = args.sources.is_empty() && !args.non_interactive;
    let sources = resolve_sources(&args, interactive)?;
    let dest_base = resolve_dest_base(&args, interactive)?;
    let name = resolve_name(&args, interactive)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            if cancel.load(Ordering::Relaxed) {
                eprintln!("\nForce quit.");
                std::process::exit(130);
            }
            cancel.store(true, Ordering::Relaxed);
            tracing::info!("cancellation requested");
            eprintln!("\nAborting... in-flight copies finish, pending work is dropped.");
        })
        .ok();
    }

    let mut options = BackupOptions::default()
        .with_workers(args.threads)
        .with_cancel_token(cancel);
    if args.no_times {
        options = options.without_timestamps();
    }

    let mut op = BackupOperation::new(options);
    op.select_sources(sources)?;
    let dest = op.select_destination(&dest_base, &name)?;
    tracing::debug!(dest = %dest.display(), workers = args.threads, "backup run starting");
    let summary = op.run()?;
    tracing::info!(
        copied = summary.copied_files,
        total = summary.total_files,
        errors = summary.error_count,
        "backup run finished"
    );
    Ok(summary)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn resolve_sources(args: &Args, interactive: bool) -> CliResult<Vec<PathBuf>> {
    if !args.sources.is_empty() {
        return Ok(args.sources.clone());
    }
    if !interactive {
        return Err(CliError::NoSources);
    }

    println!("Scanning available drives/volumes...");
    let users = discover::detect_users();
    if users.is_empty() {
        return Err(CliError::NoUsersDetected);
    }
    println!("{users}");
    let input = prompt("Enter user(s) by id# to backup>> ")?;
    users
        .resolve_selection(&input)
        .map_err(CliError::InvalidSelection)
}

fn resolve_dest_base(args: &Args, interactive: bool) -> CliResult<PathBuf> {
    if let Some(dest) = &args.dest {
        return Ok(dest.clone());
    }
    let default = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("Backups");
    if !interactive {
        return Ok(default);
    }
    println!("\nDEFAULT destination path: {}", default.display());
    let input = prompt("Enter destination path (blank=default)>> ")?;
    if input.is_empty() {
        Ok(default)
    } else {
        Ok(PathBuf::from(input))
    }
}

fn resolve_name(args: &Args, interactive: bool) -> CliResult<String> {
    if let Some(name) = &args.name {
        return Ok(name.clone());
    }
    let default = hostname();
    if !interactive {
        return Ok(default);
    }
    let input = prompt(&format!("\nEnter backup name (default: {default})>> "))?;
    if input.is_empty() {
        Ok(default)
    } else {
        Ok(input)
    }
}

fn prompt(message: &str) -> CliResult<String> {
    print!("{message}");
    io::stdout().flush().map_err(CliError::ReadInput)?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(CliError::ReadInput)?;
    Ok(line.trim().to_owned())
}

fn wait_for_ack() {
    eprintln!("Press Enter to exit.");
    let mut sink = String::new();
    let _ = io::stdin().read_line(&mut sink);
}

fn hostname() -> String {
    for var in ["HOSTNAME", "COMPUTERNAME"] {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim().to_owned();
            if !value.is_empty() {
                return value;
            }
        }
    }
    if let Ok(contents) = std::fs::read_to_string("/etc/hostname") {
        let contents = contents.trim().to_owned();
        if !contents.is_empty() {
            return contents;
        }
    }
    "backup".to_owned()
}
