/*!
 * Run orchestration: walk, read, classify, compress and record
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::classify;
use crate::compression;
use crate::config::{self, Config, Rules};
use crate::error::Result;
use crate::types::{FileRecord, ProcessingResult, RunStats, SkipReason};
use crate::walker::{relative_path, TreeWalker, WalkItem};

/// Turns a directory tree into a [`ProcessingResult`]
///
/// A processor only holds the immutable configuration. Every run owns its
/// own statistics, so independent runs never share state.
pub struct Processor {
    /// Processor configuration
    config: Config,
    /// Patterns compiled from the configuration
    rules: Rules,
    /// Progress bar
    progress: Arc<ProgressBar>,
}

impl Processor {
    /// Create a processor, validating the configuration up front
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let rules = config.compile_rules()?;

        Ok(Self {
            config,
            rules,
            progress: Arc::new(ProgressBar::hidden()),
        })
    }

    /// Report per-file progress on the given bar
    pub fn with_progress(mut self, progress: Arc<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Leave out one exact file, e.g. a previous output document
    pub fn skip_path(mut self, path: PathBuf) -> Self {
        self.rules.skip_paths.push(path);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process a whole tree
    pub fn process(&self, root: &Path) -> Result<ProcessingResult> {
        Ok(self.start(root)?.finish())
    }

    /// Begin a run that the caller drives with [`Run::step`]
    pub fn start(&self, root: &Path) -> Result<Run<'_>> {
        let root = config::validate_root(root)?;
        info!(root = %root.display(), "processing repository");

        let walker = TreeWalker::new(root.clone(), self.rules.clone());
        Ok(Run {
            processor: self,
            items: Box::new(walker.walk()),
            root,
            files: Vec::new(),
            stats: RunStats::new(),
        })
    }

    fn show_progress(&self, path: &Path) {
        self.progress.inc(1);

        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        // Truncate if too long to avoid display issues
        let display_name = if file_name.chars().count() > 40 {
            let tail: String = file_name
                .chars()
                .rev()
                .take(37)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{}", tail)
        } else {
            file_name
        };
        self.progress
            .set_message(format!("Current file: {}", display_name));
    }

    /// Turn one candidate into a record, or say why it was skipped
    fn process_file(&self, root: &Path, path: &Path) -> std::result::Result<FileRecord, SkipReason> {
        let rel_path = relative_path(root, path);

        let metadata = fs::metadata(path).map_err(|e| {
            warn!(path = %rel_path, error = %e, "cannot stat file");
            SkipReason::Unreadable
        })?;

        let size = metadata.len();
        if size < self.config.min_file_size {
            debug!(path = %rel_path, size, "below minimum size");
            return Err(SkipReason::TooSmall);
        }
        if size > self.config.max_file_size {
            debug!(path = %rel_path, size, "above maximum size");
            return Err(SkipReason::TooLarge);
        }

        let bytes = fs::read(path).map_err(|e| {
            warn!(path = %rel_path, error = %e, "cannot read file");
            SkipReason::Unreadable
        })?;

        if !self.config.include_binary_files && classify::is_binary(path, Some(&bytes)) {
            debug!(path = %rel_path, "binary file");
            return Err(SkipReason::Binary);
        }

        let text = String::from_utf8(bytes).map_err(|e| {
            warn!(path = %rel_path, error = %e, "content is not valid UTF-8");
            SkipReason::InvalidUtf8
        })?;

        // Controls such as ESC are valid UTF-8 but cannot appear in XML;
        // such content is binary for policy purposes and only kept compacted.
        let xml_safe = classify::is_xml_safe(&text);
        if !xml_safe && !self.config.include_binary_files {
            debug!(path = %rel_path, "content holds characters XML cannot carry");
            return Err(SkipReason::Binary);
        }

        let (content, compressed) = self.compact(&rel_path, text, !xml_safe)?;

        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(FileRecord {
            file_type: classify::file_type(Path::new(&rel_path)),
            path: rel_path,
            content,
            compressed,
            size,
            last_modified,
        })
    }

    /// Compress when forced, or when enabled and over the threshold.
    /// A failed optional compression keeps the literal text; a failed forced
    /// one skips the file, since its text cannot be embedded.
    fn compact(
        &self,
        rel_path: &str,
        text: String,
        force: bool,
    ) -> std::result::Result<(String, bool), SkipReason> {
        if !force
            && !compression::should_compact(
                self.config.compress_content,
                self.config.compression_threshold,
                text.len(),
            )
        {
            return Ok((text, false));
        }

        match compression::compact(&text) {
            Ok(token) => Ok((token, true)),
            Err(e) if force => {
                warn!(path = %rel_path, error = %e, "compression failed, skipping file");
                Err(SkipReason::Binary)
            }
            Err(e) => {
                warn!(path = %rel_path, error = %e, "compression failed, keeping plain text");
                Ok((text, false))
            }
        }
    }
}

/// A run in progress
///
/// Dropping a run or calling [`Run::abort`] leaves the statistics partial,
/// with no end time.
pub struct Run<'p> {
    processor: &'p Processor,
    items: Box<dyn Iterator<Item = WalkItem>>,
    root: PathBuf,
    files: Vec<FileRecord>,
    stats: RunStats,
}

impl Run<'_> {
    /// Handle the next walk entry. Returns false once the walk is exhausted.
    pub fn step(&mut self) -> bool {
        let Some(item) = self.items.next() else {
            return false;
        };

        match item {
            WalkItem::Candidate(path) => {
                self.processor.show_progress(&path);
                match self.processor.process_file(&self.root, &path) {
                    Ok(record) => {
                        debug!(path = %record.path, size = record.size, compressed = record.compressed, "accepted");
                        self.stats.record_accepted(record.size);
                        self.files.push(record);
                    }
                    Err(reason) => self.stats.record_skipped(reason),
                }
            }
            WalkItem::Filtered { path, reason } => {
                self.processor.show_progress(&path);
                debug!(path = %relative_path(&self.root, &path), %reason, "filtered");
                self.stats.record_skipped(reason);
            }
            WalkItem::Unreadable { path, error } => {
                warn!(path = %path.display(), %error, "cannot read entry");
                self.stats.record_skipped(SkipReason::Unreadable);
            }
        }

        true
    }

    /// Statistics so far
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Records accepted so far, in traversal order
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drain the remaining entries and stamp the end time
    pub fn finish(mut self) -> ProcessingResult {
        while self.step() {}
        self.stats.finish();

        info!(
            files = self.stats.total_files,
            skipped = self.stats.skipped_files,
            bytes = self.stats.total_size,
            "processing complete"
        );

        ProcessingResult {
            files: self.files,
            stats: self.stats,
        }
    }

    /// Stop early, keeping what was gathered so far
    pub fn abort(self) -> ProcessingResult {
        info!(files = self.stats.total_files, "processing aborted");

        ProcessingResult {
            files: self.files,
            stats: self.stats,
        }
    }
}
