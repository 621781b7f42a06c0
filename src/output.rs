//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and formatted tables.

use crate::auditor::AuditReport;
use crate::organizer::OrganizeSummary;
use crate::progress::ProgressReporter;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a message without any styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a bold section header preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The section title, e.g. `"SUMMARY"`
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the move phase.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use video_organizer::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Creates a spinner for work of unknown length, such as the scan.
    pub fn create_spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Prints the per-bucket move counts followed by the run totals.
    pub fn summary_table(summary: &OrganizeSummary, dry_run: bool) {
        Self::header(if dry_run { "DRY RUN SUMMARY" } else { "SUMMARY" });

        let counts = summary.moves.bucket_counts();
        let width = counts
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Already organized".len());

        if !counts.is_empty() {
            println!("{:<width$} | {}", "Bucket".bold(), "Files".bold(), width = width);
            println!("{}", "-".repeat(width + 10));
            for (bucket, count) in &counts {
                println!(
                    "{:<width$} | {} {}",
                    bucket,
                    count.to_string().green(),
                    plural(*count, "file", "files"),
                    width = width
                );
            }
            println!("{}", "-".repeat(width + 10));
        }

        let moved_label = if dry_run { "Would move" } else { "Moved" };
        let rows = [
            ("Found", summary.total_found.to_string().normal()),
            ("Already organized", summary.total_skipped.to_string().normal()),
            ("Excluded", summary.total_excluded.to_string().normal()),
            (moved_label, summary.moved().to_string().green().bold()),
            ("Failed", failed_count(summary.failed())),
        ];
        for (label, value) in rows {
            println!("{:<width$} | {}", label.bold(), value, width = width);
        }
    }

    /// Lists the files that could not be probed or moved.
    pub fn failure_list(summary: &OrganizeSummary) {
        if summary.moves.is_complete_success() {
            return;
        }
        Self::header("FAILURES");
        for line in failure_lines(summary) {
            println!("  {} {}", "-".red(), line);
        }
    }

    /// Prints the unorganized directories of an audit, or a single line when
    /// there are none.
    pub fn audit_table(root: &Path, report: &AuditReport) {
        if report.all_organized() {
            Self::info(&format!(
                "All sub-directories in '{}' are organized",
                root.display()
            ));
            return;
        }

        let rows: Vec<String> = report
            .unorganized()
            .map(|status| status.path.display().to_string())
            .collect();
        let width = rows
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Directory".len());

        println!("{:<width$} | {}", "Directory".bold(), "Organized".bold(), width = width);
        println!("{}", "-".repeat(width + 12));
        for row in &rows {
            println!("{:<width$} | {}", row, "False".red(), width = width);
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// One `path: reason` line per failed file, probe failures first.
fn failure_lines(summary: &OrganizeSummary) -> Vec<String> {
    summary
        .moves
        .probe_failures
        .iter()
        .chain(summary.moves.move_failures.iter())
        .map(|(path, reason)| format!("{}: {}", path.display(), reason))
        .collect()
}

fn failed_count(failed: usize) -> ColoredString {
    if failed == 0 {
        failed.to_string().normal()
    } else {
        failed.to_string().red().bold()
    }
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}

/// Terminal progress: a spinner while scanning, a bar while moving.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CliReporter {
    /// Creates a reporter with no bar; one is created when the scan starts.
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &Path) {
        self.set_bar(OutputFormatter::create_spinner(format!(
            "Scanning {} for video files...",
            root.display()
        )));
    }

    fn on_scan_progress(&self, files_found: usize) {
        self.with_bar(|pb| pb.set_message(format!("Scanning... {} video files found", files_found)));
    }

    fn on_scan_complete(&self, total_found: usize, total_skipped: usize) {
        self.finish_bar();
        OutputFormatter::success(&format!(
            "Scan complete: {} video {} to organize",
            total_found,
            plural(total_found, "file", "files")
        ));
        if total_skipped > 0 {
            OutputFormatter::info(&format!(
                "  skipped {} {} that {} already in bucket folders",
                total_skipped,
                plural(total_skipped, "file", "files"),
                plural(total_skipped, "was", "were")
            ));
        }
    }

    fn on_scan_failed(&self) {
        self.finish_bar();
    }

    fn on_move_start(&self, total_files: usize) {
        let pb = OutputFormatter::create_progress_bar(total_files as u64);
        pb.set_message("Organizing videos");
        self.set_bar(pb);
    }

    fn on_file_processed(&self, processed: usize, _total_files: usize) {
        self.with_bar(|pb| pb.set_position(processed as u64));
    }

    fn on_move_complete(&self, _processed: usize) {
        self.finish_bar();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mover::MoveReport;
    use std::path::PathBuf;

    fn has_bar(reporter: &CliReporter) -> bool {
        reporter
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    #[test]
    fn test_failure_lines_lists_probe_then_move_failures() {
        let summary = OrganizeSummary {
            moves: MoveReport {
                probe_failures: vec![(PathBuf::from("/v/a.mp4"), "no duration found".into())],
                move_failures: vec![(PathBuf::from("/v/b.mp4"), "in use".into())],
                ..MoveReport::default()
            },
            ..OrganizeSummary::default()
        };

        assert_eq!(
            failure_lines(&summary),
            ["/v/a.mp4: no duration found", "/v/b.mp4: in use"]
        );
    }

    #[test]
    fn test_failed_scan_clears_spinner() {
        let reporter = CliReporter::new();
        reporter.on_scan_start(Path::new("/srv/media"));
        assert!(has_bar(&reporter));

        reporter.on_scan_failed();
        assert!(!has_bar(&reporter));
    }
}
