//! Configuration loading.
//!
//! Everything is optional; an absent file means the built-in bucket table,
//! the standard video extensions and `ffprobe` from `PATH`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [[buckets]]
//! name = "Clip"
//! max_seconds = 60
//!
//! [[buckets]]
//! name = "Full"          # the last bucket needs no bound
//!
//! [scan]
//! extensions = ["mp4", "mkv"]
//! exclude = ["**/@eaDir/**"]
//! workers = 4
//!
//! [probe]
//! ffprobe = "/usr/local/bin/ffprobe"
//!
//! [organize]
//! on_collision = "rename"
//! ```

use crate::bucket::{Bucket, BucketError, BucketTable};
use crate::mover::CollisionPolicy;
use crate::scanner::ScanOptions;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".video-organizer.toml";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("bucket '{0}' needs max_seconds (only the last bucket may omit it)")]
    MissingBound(String),
    #[error(transparent)]
    Buckets(#[from] BucketError),
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("invalid video extension '{0}'")]
    InvalidExtension(String),
    #[error("scan.workers must be at least 1")]
    InvalidWorkers,
}

/// Raw configuration as read from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizerConfig {
    /// Replacement bucket table. Empty means the built-in table.
    #[serde(default)]
    pub buckets: Vec<BucketSpec>,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub organize: OrganizeSettings,
}

/// One `[[buckets]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketSpec {
    /// Folder name of the bucket.
    pub name: String,
    #[serde(default)]
    pub max_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSettings {
    /// Video extensions, without the dot. `None` keeps the standard set.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    /// Glob patterns, matched against root-relative paths, to leave alone.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Scanner thread count. Defaults to the host parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSettings {
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            ffprobe: default_ffprobe(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizeSettings {
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

/// Validated configuration, ready to hand to the scanner, mover and auditor.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    /// Classification policy.
    pub buckets: BucketTable,
    /// File selection and worker count for the scanner.
    pub scan: ScanOptions,
    /// The ffprobe executable to run.
    pub ffprobe: PathBuf,
    /// What to do when the destination name is taken.
    pub collision_policy: CollisionPolicy,
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            buckets: BucketTable::default(),
            scan: ScanOptions::default(),
            ffprobe: default_ffprobe(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (it must exist)
    /// 2. `.video-organizer.toml` in the current directory
    /// 3. `~/.config/video-organizer/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home
                .join(".config")
                .join("video-organizer")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Example
    ///
    /// ```
    /// use video_organizer::OrganizerConfig;
    ///
    /// let config = OrganizerConfig::from_toml_str("[scan]\nworkers = 2\n").unwrap();
    /// assert_eq!(config.scan.workers, Some(2));
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Validate and convert into the runtime representation.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let buckets = compile_buckets(self.buckets)?;

        let mut scan = ScanOptions::default();
        if let Some(extensions) = self.scan.extensions {
            scan.extensions = extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect::<Result<_, _>>()?;
        }
        scan.exclude = self
            .scan
            .exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        match self.scan.workers {
            Some(0) => return Err(ConfigError::InvalidWorkers),
            Some(workers) => scan.workers = workers,
            None => {}
        }

        Ok(CompiledConfig {
            buckets,
            scan,
            ffprobe: self.probe.ffprobe,
            collision_policy: self.organize.on_collision,
        })
    }
}

fn compile_buckets(specs: Vec<BucketSpec>) -> Result<BucketTable, ConfigError> {
    if specs.is_empty() {
        return Ok(BucketTable::default());
    }

    let last = specs.len() - 1;
    let buckets = specs
        .into_iter()
        .enumerate()
        .map(|(i, bucket)| match bucket.max_seconds {
            Some(bound) => Ok(Bucket::new(bucket.name, bound)),
            None if i == last => Ok(Bucket::new(bucket.name, f64::INFINITY)),
            None => Err(ConfigError::MissingBound(bucket.name)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BucketTable::new(buckets)?)
}

fn normalize_extension(ext: &str) -> Result<String, ConfigError> {
    let normalized = ext.trim().trim_start_matches('.').to_lowercase();
    if normalized.is_empty() || normalized.contains(['/', '\\', '.']) {
        return Err(ConfigError::InvalidExtension(ext.to_string()));
    }
    Ok(normalized)
}
