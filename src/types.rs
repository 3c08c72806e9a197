/*!
 * Core types and data structures for repoxml
 */

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use strum::{Display, EnumIter};

/// Why a file entry did not make it into the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Matched an exclude-files pattern
    Excluded,
    /// Include patterns are set and none matched
    NotIncluded,
    /// Smaller than the configured minimum size
    TooSmall,
    /// Larger than the configured maximum size
    TooLarge,
    /// Classified as binary while binary files are disabled
    Binary,
    /// Content was not valid UTF-8
    InvalidUtf8,
    /// Path is not valid UTF-8 or holds characters XML cannot carry
    InvalidPath,
    /// Could not be listed, stat'ed or read
    Unreadable,
}

/// One accepted file
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Root-relative path with forward slashes
    pub path: String,
    /// Literal text, or the compacted token when `compressed` is set
    pub content: String,
    /// Whether `content` holds a compacted token
    pub compressed: bool,
    /// Byte length on disk
    pub size: u64,
    /// Semantic file type label
    pub file_type: &'static str,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

/// Statistics for a single run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Number of accepted files
    pub total_files: u64,
    /// Sum of on-disk sizes of accepted files
    pub total_size: u64,
    /// Number of rejected or failed entries
    pub skipped_files: u64,
    /// Skip count per reason; always sums to `skipped_files`
    pub skipped_by_reason: BTreeMap<SkipReason, u64>,
    /// Run start
    pub start_time: DateTime<Utc>,
    /// Run end, unset while the run is in progress or was abandoned
    pub end_time: Option<DateTime<Utc>>,
}

impl RunStats {
    /// Fresh statistics starting now
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Fresh statistics with an explicit start time
    pub fn starting_at(start_time: DateTime<Utc>) -> Self {
        Self {
            total_files: 0,
            total_size: 0,
            skipped_files: 0,
            skipped_by_reason: BTreeMap::new(),
            start_time,
            end_time: None,
        }
    }

    pub fn record_accepted(&mut self, size: u64) {
        self.total_files += 1;
        self.total_size += size;
    }

    pub fn record_skipped(&mut self, reason: SkipReason) {
        self.skipped_files += 1;
        *self.skipped_by_reason.entry(reason).or_insert(0) += 1;
    }

    /// Number of skips attributed to `reason`
    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped_by_reason.get(&reason).copied().unwrap_or(0)
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate result of a run: file records in traversal order plus stats
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub files: Vec<FileRecord>,
    pub stats: RunStats,
}

impl ProcessingResult {
    /// Number of records holding compacted content
    pub fn compressed_count(&self) -> usize {
        self.files.iter().filter(|f| f.compressed).count()
    }
}
