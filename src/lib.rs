//! video-organizer - sort video files into folders by playback length
//!
//! A scan collects every video file under a root directory, each file's
//! duration is probed and classified against a [`BucketTable`], and the file
//! is moved into a bucket-named folder next to where it was found. The
//! [`auditor`] reports which directories already show that layout.

pub mod auditor;
pub mod bucket;
pub mod cli;
pub mod config;
pub mod logging;
pub mod mover;
pub mod organizer;
pub mod output;
pub mod paths;
pub mod probe;
pub mod progress;
pub mod scanner;

pub use auditor::{AuditReport, DirectoryStatus, audit};
pub use bucket::{Bucket, BucketTable};
pub use config::{CompiledConfig, ConfigError, OrganizerConfig};
pub use mover::{CollisionPolicy, MoveReport, Mover};
pub use organizer::{OrganizeSummary, organize_directory};
pub use probe::{DurationProbe, FfprobeProbe, ProbeError};
pub use progress::{ProgressReporter, SilentReporter};
pub use scanner::{Inventory, ScanOptions, ScanReport, scan};
