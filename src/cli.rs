//! Command-line interface module.
//!
//! Parses arguments, loads configuration and drives the organize and check
//! passes, printing results with [`OutputFormatter`].

use crate::auditor::{self, AuditError};
use crate::config::{ConfigError, OrganizerConfig};
use crate::mover::CollisionPolicy;
use crate::organizer::{self, OrganizeSummary};
use crate::output::{CliReporter, OutputFormatter};
use crate::paths;
use crate::probe::FfprobeProbe;
use crate::scanner::ScanError;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(
    name = "video-organizer",
    version,
    about = "A CLI tool to organize videos by duration"
)]
/// Command-line arguments.
pub struct Cli {
    /// Configuration file (defaults to .video-organizer.toml, then
    /// ~/.config/video-organizer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Organize the directory
    Organize {
        directory: String,

        /// Show where files would go without moving anything
        #[arg(long)]
        dry_run: bool,

        /// What to do when a file of the same name is already in the bucket
        /// folder: skip or rename
        #[arg(long, value_name = "POLICY")]
        on_collision: Option<CollisionPolicy>,
    },
    /// Check a directory to see if it's been organized
    Check { directory: String },
}

/// Errors that end a CLI invocation with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid directory '{input}': {source}")]
    InvalidDirectory {
        input: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("error organizing videos: {0}")]
    Scan(#[from] ScanError),
    #[error("error checking directories: {0}")]
    Audit(#[from] AuditError),
}

/// Runs a parsed command.
///
/// Per-file probe and move failures are reported but do not make this
/// return an error.
pub fn run_cli(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Organize {
            directory,
            dry_run,
            on_collision,
        } => {
            let root = resolve_directory(directory)?;
            organize(&root, cli.config.as_deref(), *dry_run, *on_collision).map(|_| ())
        }
        Command::Check { directory } => {
            let root = resolve_directory(directory)?;
            check(&root, cli.config.as_deref())
        }
    }
}

fn resolve_directory(input: &str) -> Result<PathBuf, CliError> {
    paths::format_directory(input).map_err(|source| CliError::InvalidDirectory {
        input: input.to_string(),
        source,
    })
}

/// Organizes `root` using ffprobe and terminal progress output.
pub fn organize(
    root: &Path,
    config_path: Option<&Path>,
    dry_run: bool,
    on_collision: Option<CollisionPolicy>,
) -> Result<OrganizeSummary, CliError> {
    let mut config = OrganizerConfig::load(config_path)?.compile()?;
    if let Some(policy) = on_collision {
        config.collision_policy = policy;
    }

    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", root.display()));
    } else {
        OutputFormatter::info(&format!("Organizing contents of: {}", root.display()));
    }

    let probe = FfprobeProbe::new(config.ffprobe.clone());
    let reporter = CliReporter::new();
    let summary = organizer::organize_directory(root, &config, &probe, &reporter, dry_run)?;

    if dry_run {
        for record in &summary.moves.moved {
            OutputFormatter::plain(&format!(
                " - {}\n   → Would move to {}/",
                record.original_path.display(),
                record.bucket
            ));
        }
    }

    OutputFormatter::summary_table(&summary, dry_run);
    OutputFormatter::failure_list(&summary);

    if summary.failed() > 0 {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    } else if dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(summary)
}

/// Audits `root` and prints the directories that still need organizing.
pub fn check(root: &Path, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = OrganizerConfig::load(config_path)?.compile()?;
    let report = auditor::audit(root, &config.buckets)?;
    OutputFormatter::audit_table(root, &report);
    Ok(())
}
