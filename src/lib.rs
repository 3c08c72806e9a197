/*!
 * repoxml - Serialize a source tree into a single XML document
 *
 * Walks a directory, selects files by include/exclude rules, optionally
 * compresses large files and renders everything, with run statistics, as
 * one XML document.
 */

pub mod classify;
pub mod compression;
pub mod config;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod processor;
pub mod report;
pub mod types;
pub mod utils;
pub mod walker;
pub mod writer;


// Re-export main components for easier access
pub use config::{Args, Config};
pub use error::{RepoXmlError, Result};
pub use pattern::PatternSet;
pub use processor::{Processor, Run};
pub use report::{FileReportInfo, ReportFormat, Reporter, ScanReport};
pub use types::{FileRecord, ProcessingResult, RunStats, SkipReason};
pub use utils::{count_files, format_file_size};
pub use walker::{TreeWalker, WalkItem};
pub use writer::XmlWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
