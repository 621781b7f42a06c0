//! Moving video files into their bucket folders.
//!
//! Every file is handled on its own: a probe or move failure is recorded in
//! the [`MoveReport`] and the run carries on with the next file. Nothing is
//! rolled back and an existing file is never overwritten.

use crate::bucket::BucketTable;
use crate::probe::DurationProbe;
use crate::progress::ProgressReporter;
use crate::scanner::Inventory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What to do when the destination file name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the source where it is and report a failure.
    #[default]
    Skip,
    /// Append ` (1)`, ` (2)`, ... to the file stem until the name is free.
    Rename,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "rename" => Ok(Self::Rename),
            other => Err(format!(
                "unknown collision policy '{}' (expected 'skip' or 'rename')",
                other
            )),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Rename => f.write_str("rename"),
        }
    }
}

/// A file that was (or, in a dry run, would be) moved.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    /// The original path of the file.
    pub original_path: PathBuf,
    /// The path inside the bucket folder.
    pub new_path: PathBuf,
    /// The bucket the file was classified into.
    pub bucket: String,
}

/// Per-file move failures.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("{} already exists", to.display())]
    TargetExists { from: PathBuf, to: PathBuf },

    #[error("{} is in use or not accessible: {source}", path.display())]
    Locked { path: PathBuf, source: io::Error },

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
}

/// Outcome of an organize pass.
#[derive(Debug, Default)]
pub struct MoveReport {
    /// Files moved (or, in a dry run, that would be moved), in processing order.
    pub moved: Vec<MoveRecord>,
    /// Files whose directory already is a bucket folder.
    pub skipped: usize,
    /// Files whose duration could not be determined, with the reason.
    pub probe_failures: Vec<(PathBuf, String)>,
    /// Files that could not be relocated, with the reason.
    pub move_failures: Vec<(PathBuf, String)>,
    /// Files handled so far, whatever their outcome.
    pub processed: usize,
}

impl MoveReport {
    /// Number of moved files per bucket name.
    pub fn bucket_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.moved {
            *counts.entry(record.bucket.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of files that could not be probed or moved.
    pub fn failed(&self) -> usize {
        self.probe_failures.len() + self.move_failures.len()
    }

    /// True when no file failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Classifies inventoried files and moves them into bucket folders next to
/// where they were found.
pub struct Mover<'a> {
    buckets: &'a BucketTable,
    probe: &'a dyn DurationProbe,
    collision_policy: CollisionPolicy,
    dry_run: bool,
}

impl<'a> Mover<'a> {
    /// Creates a mover that skips on collision and really moves files.
    ///
    /// # Arguments
    ///
    /// * `buckets` - Table used to classify each duration
    /// * `probe` - Source of file durations
    pub fn new(buckets: &'a BucketTable, probe: &'a dyn DurationProbe) -> Self {
        Self {
            buckets,
            probe,
            collision_policy: CollisionPolicy::default(),
            dry_run: false,
        }
    }

    /// Sets what happens when the destination name is already taken.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// When set, files are probed and classified but nothing on disk changes.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Processes every file of `inventory`, in key order.
    pub fn organize(&self, inventory: &Inventory, reporter: &dyn ProgressReporter) -> MoveReport {
        let total: usize = inventory.values().map(Vec::len).sum();
        let mut report = MoveReport::default();
        reporter.on_move_start(total);

        for (key, files) in inventory {
            let in_bucket = key
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| self.buckets.contains(name));

            for file in files {
                if in_bucket {
                    debug!("Skipping {}: already in a bucket folder", file.display());
                    report.skipped += 1;
                } else {
                    self.process_file(file, &mut report);
                }
                report.processed += 1;
                reporter.on_file_processed(report.processed, total);
            }
        }

        info!(
            "Processed {} files: {} moved, {} skipped, {} failed",
            report.processed,
            report.moved.len(),
            report.skipped,
            report.failed()
        );
        reporter.on_move_complete(report.processed);
        report
    }

    fn process_file(&self, file: &Path, report: &mut MoveReport) {
        let duration = match self.probe.probe(file) {
            Ok(Some(duration)) => duration,
            Ok(None) => {
                warn!("Skipping {}: not a readable video", file.display());
                report
                    .probe_failures
                    .push((file.to_path_buf(), "invalid media data".to_string()));
                return;
            }
            Err(e) => {
                warn!("Error getting duration for {}: {}", file.display(), e);
                report.probe_failures.push((file.to_path_buf(), e.to_string()));
                return;
            }
        };

        let bucket = self.buckets.classify(duration);
        let result = if self.dry_run {
            plan_destination(file, bucket, self.collision_policy).map(|new_path| MoveRecord {
                original_path: file.to_path_buf(),
                new_path,
                bucket: bucket.to_string(),
            })
        } else {
            move_into_bucket(file, bucket, self.collision_policy)
        };

        match result {
            Ok(record) => {
                debug!(
                    "{} -> {} ({:.1}s)",
                    record.original_path.display(),
                    record.new_path.display(),
                    duration
                );
                report.moved.push(record);
            }
            Err(e) => {
                match &e {
                    MoveError::Locked { path, .. } => {
                        warn!("Skipping file in use: {}", path.display())
                    }
                    other => warn!("{}", other),
                }
                report.move_failures.push((file.to_path_buf(), e.to_string()));
            }
        }
    }
}

/// Computes where `file_path` would land inside its `bucket` folder without
/// touching the filesystem.
pub fn plan_destination(
    file_path: &Path,
    bucket: &str,
    policy: CollisionPolicy,
) -> Result<PathBuf, MoveError> {
    let file_name = file_path
        .file_name()
        .ok_or_else(|| MoveError::NoFileName(file_path.to_path_buf()))?;
    let bucket_dir = file_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(bucket);
    let destination = bucket_dir.join(file_name);

    if !path_taken(&destination) {
        return Ok(destination);
    }

    match policy {
        CollisionPolicy::Skip => Err(MoveError::TargetExists {
            from: file_path.to_path_buf(),
            to: destination,
        }),
        CollisionPolicy::Rename => Ok(numbered_destination(&bucket_dir, file_path)),
    }
}

/// Moves a file into the `bucket` folder beside it, creating the folder if
/// needed.
///
/// # Examples
///
/// ```no_run
/// use video_organizer::mover::{move_into_bucket, CollisionPolicy};
/// use std::path::Path;
///
/// match move_into_bucket(Path::new("/videos/show/clip.mp4"), "Micro", CollisionPolicy::Skip) {
///     Ok(record) => println!("Moved to {}", record.new_path.display()),
///     Err(e) => eprintln!("Move failed: {}", e),
/// }
/// ```
pub fn move_into_bucket(
    file_path: &Path,
    bucket: &str,
    policy: CollisionPolicy,
) -> Result<MoveRecord, MoveError> {
    let destination = plan_destination(file_path, bucket, policy)?;

    if let Some(bucket_dir) = destination.parent() {
        fs::create_dir_all(bucket_dir).map_err(|source| MoveError::DirectoryCreationFailed {
            path: bucket_dir.to_path_buf(),
            source,
        })?;
    }

    rename_no_replace(file_path, &destination).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            MoveError::TargetExists {
                from: file_path.to_path_buf(),
                to: destination.clone(),
            }
        } else if is_locked(&source) {
            MoveError::Locked {
                path: file_path.to_path_buf(),
                source,
            }
        } else {
            MoveError::FileMoveFailure {
                from: file_path.to_path_buf(),
                to: destination.clone(),
                source,
            }
        }
    })?;

    Ok(MoveRecord {
        original_path: file_path.to_path_buf(),
        new_path: destination,
        bucket: bucket.to_string(),
    })
}

/// Renames `from` to `to`, failing with `AlreadyExists` instead of replacing
/// a file that appeared at `to` after the destination was planned.
///
/// A hard link claims the destination atomically. Filesystems without hard
/// links fall back to a checked `rename`.
fn rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => fs::remove_file(from).inspect_err(|_| {
            // keep exactly one copy
            let _ = fs::remove_file(to);
        }),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(e),
        Err(e) => {
            debug!("hard link to {} failed ({}), renaming instead", to.display(), e);
            if path_taken(to) {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            fs::rename(from, to)
        }
    }
}

fn path_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn numbered_destination(bucket_dir: &Path, file_path: &Path) -> PathBuf {
    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u64..)
        .map(|n| bucket_dir.join(format!("{} ({}){}", stem, n, extension)))
        .find(|candidate| !path_taken(candidate))
        .unwrap_or_else(|| bucket_dir.join(format!("{}{}", stem, extension)))
}

/// True for errors meaning another process holds the file or access was
/// refused.
fn is_locked(err: &io::Error) -> bool {
    // 32/33: ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ResourceBusy
    ) || (cfg!(windows) && matches!(err.raw_os_error(), Some(32 | 33)))
}
