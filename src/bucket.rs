//! Duration buckets and the classification rule.
//!
//! A [`BucketTable`] is an ordered list of named duration ranges. A video is
//! classified into the first bucket whose upper bound strictly exceeds its
//! duration; the last bucket catches everything else.
//!
//! # Examples
//!
//! ```
//! use video_organizer::bucket::BucketTable;
//!
//! let table = BucketTable::default();
//! assert_eq!(table.classify(14.999), "Micro");
//! assert_eq!(table.classify(15.0), "Mini");
//! assert_eq!(table.classify(86_400.0), "Epic");
//! ```
use std::collections::HashSet;
use thiserror::Error;

/// A named duration range.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Folder name used for files in this bucket.
    pub name: String,
    /// Exclusive upper bound in seconds. Infinite for the last bucket.
    pub max_duration_secs: f64,
}

impl Bucket {
    /// Creates a bucket. Nothing is validated until it is part of a
    /// [`BucketTable`].
    ///
    /// # Arguments
    ///
    /// * `name` - Folder name for files in this bucket
    /// * `max_duration_secs` - Exclusive upper bound in seconds
    pub fn new(name: impl Into<String>, max_duration_secs: f64) -> Self {
        Self {
            name: name.into(),
            max_duration_secs,
        }
    }
}

/// Reasons a list of buckets cannot form a table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BucketError {
    #[error("bucket table must contain at least one bucket")]
    Empty,
    #[error("invalid bucket name '{0}': names must be plain folder names")]
    InvalidName(String),
    #[error("duplicate bucket name '{0}'")]
    DuplicateName(String),
    #[error("bucket '{name}' has an invalid bound {bound}: bounds must be positive")]
    InvalidBound { name: String, bound: f64 },
    #[error("bucket '{name}' bound {bound} does not exceed the previous bound {previous}")]
    NotAscending {
        name: String,
        bound: f64,
        previous: f64,
    },
}

/// Immutable, validated classification policy.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTable {
    buckets: Vec<Bucket>,
}

impl BucketTable {
    /// Validates `buckets` and builds a table.
    ///
    /// Bounds must be positive and strictly ascending. The bound of the last
    /// bucket is ignored and stored as infinity, so it catches every duration
    /// the earlier buckets do not.
    pub fn new(mut buckets: Vec<Bucket>) -> Result<Self, BucketError> {
        let Some(last) = buckets.last_mut() else {
            return Err(BucketError::Empty);
        };
        last.max_duration_secs = f64::INFINITY;

        let mut seen = HashSet::new();
        let mut previous = 0.0_f64;
        for bucket in &buckets {
            if !is_valid_folder_name(&bucket.name) {
                return Err(BucketError::InvalidName(bucket.name.clone()));
            }
            if !seen.insert(bucket.name.as_str()) {
                return Err(BucketError::DuplicateName(bucket.name.clone()));
            }
            if bucket.max_duration_secs.is_nan() || bucket.max_duration_secs <= 0.0 {
                return Err(BucketError::InvalidBound {
                    name: bucket.name.clone(),
                    bound: bucket.max_duration_secs,
                });
            }
            if bucket.max_duration_secs <= previous {
                return Err(BucketError::NotAscending {
                    name: bucket.name.clone(),
                    bound: bucket.max_duration_secs,
                    previous,
                });
            }
            previous = bucket.max_duration_secs;
        }

        Ok(Self { buckets })
    }

    /// Returns the index of the bucket `duration_secs` falls into.
    pub fn classify_index(&self, duration_secs: f64) -> usize {
        self.buckets
            .iter()
            .position(|bucket| duration_secs < bucket.max_duration_secs)
            .unwrap_or(self.buckets.len() - 1)
    }

    /// Returns the name of the bucket `duration_secs` falls into.
    pub fn classify(&self, duration_secs: f64) -> &str {
        &self.buckets[self.classify_index(duration_secs)].name
    }

    /// Returns true if `name` is exactly the name of a bucket.
    pub fn contains(&self, name: &str) -> bool {
        self.buckets.iter().any(|bucket| bucket.name == name)
    }

    /// The buckets in ascending order of their bounds.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Bucket names in table order.
    ///
    /// # Example
    ///
    /// ```
    /// use video_organizer::BucketTable;
    ///
    /// let table = BucketTable::default();
    /// assert_eq!(table.names().next(), Some("Micro"));
    /// ```
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|bucket| bucket.name.as_str())
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false for a validated table.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for BucketTable {
    fn default() -> Self {
        Self {
            buckets: vec![
                Bucket::new("Micro", 15.0),
                Bucket::new("Mini", 60.0),
                Bucket::new("Short", 5.0 * 60.0),
                Bucket::new("Medium", 15.0 * 60.0),
                Bucket::new("Long", 30.0 * 60.0),
                Bucket::new("Extended", 60.0 * 60.0),
                Bucket::new("Feature", 120.0 * 60.0),
                Bucket::new("Epic", f64::INFINITY),
            ],
        }
    }
}

fn is_valid_folder_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && name.trim() == name
}
