//! The organize pass: scan the whole tree, then classify and move.

use crate::config::CompiledConfig;
use crate::mover::{MoveReport, Mover};
use crate::probe::DurationProbe;
use crate::progress::ProgressReporter;
use crate::scanner::{self, ScanError};
use std::path::Path;

/// Counts from a complete organize pass.
#[derive(Debug, Default)]
pub struct OrganizeSummary {
    /// Files the scan put in the inventory.
    pub total_found: usize,
    /// Files already inside a bucket folder when the scan ran.
    pub total_skipped: usize,
    /// Video files matching an exclude pattern.
    pub total_excluded: usize,
    /// Outcome of the move phase.
    pub moves: MoveReport,
}

impl OrganizeSummary {
    /// Files moved, or that would be moved in a dry run.
    pub fn moved(&self) -> usize {
        self.moves.moved.len()
    }

    /// Files left in place because of a probe or move failure.
    pub fn failed(&self) -> usize {
        self.moves.failed()
    }
}

/// Organizes every video under `root` into bucket folders.
///
/// Moving only starts after the scan has finished, so a file is never moved
/// while the walk could still reach it. Only scan errors are returned;
/// per-file problems end up in [`OrganizeSummary::moves`].
pub fn organize_directory(
    root: &Path,
    config: &CompiledConfig,
    probe: &dyn DurationProbe,
    reporter: &dyn ProgressReporter,
    dry_run: bool,
) -> Result<OrganizeSummary, ScanError> {
    let scan = scanner::scan(root, &config.scan, &config.buckets, reporter)?;

    let moves = Mover::new(&config.buckets, probe)
        .collision_policy(config.collision_policy)
        .dry_run(dry_run)
        .organize(&scan.inventory, reporter);

    Ok(OrganizeSummary {
        total_found: scan.total_found,
        total_skipped: scan.total_skipped,
        total_excluded: scan.total_excluded,
        moves,
    })
}
