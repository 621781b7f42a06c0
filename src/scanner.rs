//! Concurrent discovery of video files.
//!
//! The tree is walked one directory level at a time. Each level is read in
//! parallel on a bounded rayon pool and the next level is only started once
//! the current one has been fully processed, so there is no recursion and the
//! number of open directory handles never exceeds the worker count.

use crate::bucket::BucketTable;
use crate::progress::ProgressReporter;
use glob::Pattern;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Extensions recognized as video files when no override is configured.
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 11] = [
    "mp4", "avi", "mov", "mkv", "ts", "m4v", "wmv", "flv", "webm", "mpg", "mpeg",
];

/// Files to organize, keyed by their parent directory relative to the scan
/// root. Files directly in the root are stored under the empty path.
pub type Inventory = BTreeMap<PathBuf, Vec<PathBuf>>;

/// Fatal scanner errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to start scanner workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Which files the scanner considers and how many threads it uses.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercase extensions without the leading dot.
    pub extensions: HashSet<String>,
    /// Root-relative paths matching any of these are left alone.
    pub exclude: Vec<Pattern>,
    /// Size of the directory-reading thread pool. Defaults to the number
    /// of available CPUs.
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            exclude: Vec::new(),
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl ScanOptions {
    /// Returns true if the file name has one of the configured extensions,
    /// compared case-insensitively.
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path(relative))
    }
}

/// Result of a completed scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Files to organize, grouped by parent directory.
    pub inventory: Inventory,
    /// Files added to the inventory.
    pub total_found: usize,
    /// Video files already sitting directly inside a bucket folder.
    pub total_skipped: usize,
    /// Video files matching an exclude pattern.
    pub total_excluded: usize,
}

impl ScanReport {
    /// Iterates over `(directory key, file path)` pairs in key order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.inventory
            .iter()
            .flat_map(|(key, files)| files.iter().map(move |file| (key.as_path(), file.as_path())))
    }
}

struct ScanState<'a> {
    root: &'a Path,
    options: &'a ScanOptions,
    buckets: &'a BucketTable,
    reporter: &'a dyn ProgressReporter,
    inventory: Mutex<Inventory>,
    found: AtomicUsize,
    skipped: AtomicUsize,
    excluded: AtomicUsize,
}

impl ScanState<'_> {
    /// Reads one directory, records its video files and returns the
    /// subdirectories to visit next.
    fn visit(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let read_error = |source: std::io::Error| ScanError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let key = dir.strip_prefix(self.root).unwrap_or(dir).to_path_buf();
        let inside_bucket = key
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.buckets.contains(name));

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        let mut skipped = 0;
        let mut excluded = 0;

        for entry in fs::read_dir(dir).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let relative = path.strip_prefix(self.root).unwrap_or(&path);

            if file_type.is_dir() {
                if self.options.is_excluded(relative) {
                    debug!("Not descending into excluded {}", relative.display());
                } else {
                    subdirs.push(path);
                }
            } else if file_type.is_file() && self.options.is_video_file(&path) {
                if self.options.is_excluded(relative) {
                    excluded += 1;
                } else if inside_bucket {
                    debug!("Already organized: {}", path.display());
                    skipped += 1;
                } else {
                    files.push(path);
                }
            }
        }

        self.skipped.fetch_add(skipped, Ordering::Relaxed);
        self.excluded.fetch_add(excluded, Ordering::Relaxed);

        if !files.is_empty() {
            let found = files.len();
            self.inventory
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default()
                .extend(files);
            let total = self.found.fetch_add(found, Ordering::Relaxed) + found;
            self.reporter.on_scan_progress(total);
        }

        Ok(subdirs)
    }
}

/// Walks `root` and builds the inventory of video files to organize.
///
/// Files directly inside a folder named after a bucket are counted as
/// skipped. A directory that cannot be listed aborts the whole scan; an
/// entry whose type cannot be read is logged and ignored. Symlinks are not
/// followed.
pub fn scan(
    root: &Path,
    options: &ScanOptions,
    buckets: &BucketTable,
    reporter: &dyn ProgressReporter,
) -> Result<ScanReport, ScanError> {
    let metadata = fs::metadata(root).map_err(|source| ScanError::ReadDir {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .thread_name(|i| format!("scan-{}", i))
        .build()?;

    reporter.on_scan_start(root);

    let state = ScanState {
        root,
        options,
        buckets,
        reporter,
        inventory: Mutex::new(Inventory::new()),
        found: AtomicUsize::new(0),
        skipped: AtomicUsize::new(0),
        excluded: AtomicUsize::new(0),
    };

    let mut frontier = vec![root.to_path_buf()];
    while !frontier.is_empty() {
        let next_level = pool.install(|| {
            frontier
                .par_iter()
                .map(|dir| state.visit(dir))
                .collect::<Result<Vec<_>, _>>()
        })
        .inspect_err(|_| reporter.on_scan_failed())?;
        frontier = next_level.into_iter().flatten().collect();
    }

    let mut inventory = state
        .inventory
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    for files in inventory.values_mut() {
        files.sort();
    }

    let report = ScanReport {
        total_found: inventory.values().map(Vec::len).sum(),
        total_skipped: state.skipped.into_inner(),
        total_excluded: state.excluded.into_inner(),
        inventory,
    };

    info!(
        "Scanned {}: {} found, {} already organized, {} excluded",
        root.display(),
        report.total_found,
        report.total_skipped,
        report.total_excluded
    );
    reporter.on_scan_complete(report.total_found, report.total_skipped);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not really a video").unwrap();
        path
    }

    fn scan_default(root: &Path) -> ScanReport {
        scan(
            root,
            &ScanOptions::default(),
            &BucketTable::default(),
            &SilentReporter,
        )
        .expect("scan should succeed")
    }

    #[test]
    fn test_is_video_file_case_insensitive() {
        let options = ScanOptions::default();
        assert!(options.is_video_file(Path::new("a.mp4")));
        assert!(options.is_video_file(Path::new("a.MKV")));
        assert!(options.is_video_file(Path::new("dir/a.Mpeg")));
        assert!(!options.is_video_file(Path::new("a.txt")));
        assert!(!options.is_video_file(Path::new("mp4")));
        assert!(!options.is_video_file(Path::new("a.mp4.part")));
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        let report = scan_default(temp.path());
        assert!(report.inventory.is_empty());
        assert_eq!(report.total_found, 0);
        assert_eq!(report.total_skipped, 0);
    }

    #[test]
    fn test_groups_files_by_relative_parent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let a = touch(root, "a.mp4");
        let b = touch(root, "show/b.mkv");
        let c = touch(root, "show/c.avi");
        let d = touch(root, "show/season1/d.webm");
        touch(root, "show/notes.txt");

        let report = scan_default(root);

        assert_eq!(report.total_found, 4);
        assert_eq!(report.inventory[Path::new("")], vec![a]);
        assert_eq!(report.inventory[Path::new("show")], vec![b, c]);
        assert_eq!(report.inventory[Path::new("show/season1")], vec![d]);
    }

    #[test]
    fn test_skips_files_directly_inside_bucket_folders() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "show/Micro/a.mp4");
        touch(root, "show/Epic/b.mp4");
        let nested = touch(root, "show/Micro/extras/c.mp4");
        let fresh = touch(root, "show/d.mp4");

        let report = scan_default(root);

        assert_eq!(report.total_skipped, 2);
        assert_eq!(report.total_found, 2);
        assert_eq!(report.inventory[Path::new("show/Micro/extras")], vec![nested]);
        assert_eq!(report.inventory[Path::new("show")], vec![fresh]);
    }

    #[test]
    fn test_bucket_match_is_case_sensitive() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "micro/a.mp4");

        let report = scan_default(temp.path());
        assert_eq!(report.total_found, 1);
        assert_eq!(report.total_skipped, 0);
    }

    #[test]
    fn test_found_matches_inventory_size() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in 0..5 {
            for file in 0..7 {
                touch(root, &format!("d{}/sub{}/f{}.mp4", dir, dir % 2, file));
            }
        }

        let report = scan_default(root);
        let listed: usize = report.inventory.values().map(Vec::len).sum();
        assert_eq!(report.total_found, 35);
        assert_eq!(listed, report.total_found);
        assert_eq!(report.files().count(), report.total_found);
    }

    #[test]
    fn test_single_worker_matches_parallel_scan() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for i in 0..20 {
            touch(root, &format!("dir{}/nested/clip{}.mov", i % 4, i));
        }

        let parallel = scan_default(root);
        let serial = scan(
            root,
            &ScanOptions {
                workers: 1,
                ..ScanOptions::default()
            },
            &BucketTable::default(),
            &SilentReporter,
        )
        .unwrap();

        assert_eq!(parallel.inventory, serial.inventory);
    }

    #[test]
    fn test_exclude_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "show/@eaDir/thumb.mp4");
        touch(root, "show/sample.mkv");
        let kept = touch(root, "show/episode.mkv");

        let options = ScanOptions {
            exclude: vec![
                Pattern::new("**/@eaDir").unwrap(),
                Pattern::new("**/sample.*").unwrap(),
            ],
            ..ScanOptions::default()
        };
        let report = scan(root, &options, &BucketTable::default(), &SilentReporter).unwrap();

        assert_eq!(report.total_found, 1);
        assert_eq!(report.total_excluded, 1);
        assert_eq!(report.inventory[Path::new("show")], vec![kept]);
    }

    #[test]
    fn test_custom_buckets_change_skip_rule() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "Clips/a.mp4");
        touch(root, "Micro/b.mp4");

        let table = BucketTable::new(vec![
            crate::bucket::Bucket::new("Clips", 60.0),
            crate::bucket::Bucket::new("Rest", f64::INFINITY),
        ])
        .unwrap();
        let report = scan(root, &ScanOptions::default(), &table, &SilentReporter).unwrap();

        assert_eq!(report.total_skipped, 1);
        assert!(report.inventory.contains_key(Path::new("Micro")));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let result = scan(
            &temp.path().join("missing"),
            &ScanOptions::default(),
            &BucketTable::default(),
            &SilentReporter,
        );
        assert!(matches!(result, Err(ScanError::ReadDir { .. })));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = touch(temp.path(), "a.mp4");
        let result = scan(
            &file,
            &ScanOptions::default(),
            &BucketTable::default(),
            &SilentReporter,
        );
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_aborts_scan() {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::atomic::AtomicBool;

        #[derive(Default)]
        struct Recording {
            started: AtomicBool,
            failed: AtomicBool,
            completed: AtomicBool,
        }
        impl ProgressReporter for Recording {
            fn on_scan_start(&self, _root: &Path) {
                self.started.store(true, Ordering::SeqCst);
            }
            fn on_scan_complete(&self, _found: usize, _skipped: usize) {
                self.completed.store(true, Ordering::SeqCst);
            }
            fn on_scan_failed(&self) {
                self.failed.store(true, Ordering::SeqCst);
            }
        }

        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.mp4");
        touch(temp.path(), "show/season/b.mp4");
        let locked = temp.path().join("show/season");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // root can still list it
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let reporter = Recording::default();
        let result = scan(
            temp.path(),
            &ScanOptions::default(),
            &BucketTable::default(),
            &reporter,
        );
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(ScanError::ReadDir { path, .. }) => assert_eq!(path, locked),
            other => panic!("expected ReadDir error, got {:?}", other),
        }
        assert!(reporter.started.load(Ordering::SeqCst));
        assert!(reporter.failed.load(Ordering::SeqCst));
        assert!(!reporter.completed.load(Ordering::SeqCst));
    }
}
