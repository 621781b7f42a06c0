use std::path::Path;

/// Observer for scan and move progress.
///
/// The CLI implements it with indicatif bars; library callers and tests can
/// use [`SilentReporter`]. All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_scan_progress(&self, _files_found: usize) {}
    fn on_scan_complete(&self, _total_found: usize, _total_skipped: usize) {}
    /// Called instead of `on_scan_complete` when the scan aborts.
    fn on_scan_failed(&self) {}
    fn on_move_start(&self, _total_files: usize) {}
    fn on_file_processed(&self, _processed: usize, _total_files: usize) {}
    fn on_move_complete(&self, _processed: usize) {}
}

/// No-op progress reporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
