//! Read-only check of whether a tree has already been organized.
//!
//! A child directory of the root counts as organized when it has a `videos`
//! folder (any case) containing at least one bucket-named folder. The folder
//! layout is the only record of a previous run.

use crate::bucket::BucketTable;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const VIDEOS_DIR: &str = "videos";

#[derive(Debug, Error)]
#[error("failed to read directory {}: {source}", path.display())]
pub struct AuditError {
    /// The directory that could not be listed.
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Audit result for one child directory of the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStatus {
    /// Immediate subdirectory of the audited root.
    pub path: PathBuf,
    /// True when its `videos` folder holds a bucket folder.
    pub organized: bool,
}

#[derive(Debug, Default)]
pub struct AuditReport {
    /// Every immediate subdirectory of the root, sorted by path.
    pub directories: Vec<DirectoryStatus>,
}

impl AuditReport {
    /// Directories that still need organizing, in path order.
    pub fn unorganized(&self) -> impl Iterator<Item = &DirectoryStatus> {
        self.directories.iter().filter(|status| !status.organized)
    }

    /// True when no directory needs organizing, including when there are
    /// no subdirectories at all.
    pub fn all_organized(&self) -> bool {
        self.unorganized().next().is_none()
    }
}

/// Checks every immediate subdirectory of `root`.
///
/// Any directory that cannot be listed aborts the audit.
pub fn audit(root: &Path, buckets: &BucketTable) -> Result<AuditReport, AuditError> {
    let mut directories = Vec::new();

    for child in subdirectories(root)? {
        let organized = match find_videos_dir(&child)? {
            Some(videos_dir) => has_bucket_folder(&videos_dir, buckets)?,
            None => false,
        };
        debug!("{}: organized = {}", child.display(), organized);
        directories.push(DirectoryStatus {
            path: child,
            organized,
        });
    }

    directories.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(AuditReport { directories })
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, AuditError> {
    let read_error = |source: std::io::Error| AuditError {
        path: dir.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if entry.file_type().map_err(read_error)?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn find_videos_dir(dir: &Path) -> Result<Option<PathBuf>, AuditError> {
    Ok(subdirectories(dir)?.into_iter().find(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.eq_ignore_ascii_case(VIDEOS_DIR))
    }))
}

fn has_bucket_folder(videos_dir: &Path, buckets: &BucketTable) -> Result<bool, AuditError> {
    Ok(subdirectories(videos_dir)?.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| buckets.contains(name))
    }))
}
