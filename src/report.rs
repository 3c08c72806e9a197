/*!
 * Reporting functionality for repoxml
 *
 * Renders a console summary of a finished run using the tabled library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::{ProcessingResult, SkipReason};
use crate::utils::format_file_size;

/// Information about one accepted file in the report
#[derive(Debug, Clone)]
pub struct FileReportInfo {
    /// Root-relative path
    pub path: String,
    /// Size on disk
    pub size: u64,
    /// Whether the content was compressed
    pub compressed: bool,
}

/// Statistics for a finished run
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Output file path
    pub output_file: String,
    /// Time taken to process and write
    pub duration: Duration,
    /// Number of files written
    pub files_processed: u64,
    /// Number of files skipped
    pub files_skipped: u64,
    /// Skips per reason, non-zero entries only
    pub skipped_by_reason: Vec<(SkipReason, u64)>,
    /// Sum of accepted file sizes
    pub total_size: u64,
    /// Number of files with compressed content
    pub compressed_files: usize,
    /// Details for each file
    pub file_details: Vec<FileReportInfo>,
}

impl ScanReport {
    /// Build a report from a processing result
    pub fn from_result(result: &ProcessingResult, output_file: String, duration: Duration) -> Self {
        Self {
            output_file,
            duration,
            files_processed: result.stats.total_files,
            files_skipped: result.stats.skipped_files,
            skipped_by_reason: result
                .stats
                .skipped_by_reason
                .iter()
                .map(|(reason, count)| (*reason, *count))
                .collect(),
            total_size: result.stats.total_size,
            compressed_files: result.compressed_count(),
            file_details: result
                .files
                .iter()
                .map(|f| FileReportInfo {
                    path: f.path.clone(),
                    size: f.size,
                    compressed: f.compressed,
                })
                .collect(),
        }
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for run results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: u64) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &ScanReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stderr, keeping stdout free for the document
    pub fn print_report(&self, report: &ScanReport) {
        eprintln!("\n{}", self.generate_report(report));
    }

    // Keep the tail of long paths, cut at a separator
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut segments = Vec::new();
        let mut current_len = 3; // "..."
        for part in path.split('/').rev() {
            let part_len = part.chars().count() + 1;
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        if segments.is_empty() {
            let tail: String = path
                .chars()
                .rev()
                .take(max_len.saturating_sub(3))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return format!("...{}", tail);
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn style(table: &mut Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
        table.to_string()
    }

    fn create_summary_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "📂 Output File".to_string(),
                value: report.output_file.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Files Processed".to_string(),
                value: self.format_number(report.files_processed),
            },
            SummaryRow {
                key: "📦 Total Size".to_string(),
                value: format_file_size(report.total_size),
            },
            SummaryRow {
                key: "🗜️ Compressed".to_string(),
                value: self.format_number(report.compressed_files as u64),
            },
            SummaryRow {
                key: "⏭️ Files Skipped".to_string(),
                value: self.format_number(report.files_skipped),
            },
        ];

        for (reason, count) in &report.skipped_by_reason {
            rows.push(SummaryRow {
                key: format!("   {}", reason),
                value: self.format_number(*count),
            });
        }

        Self::style(&mut Table::new(rows))
    }

    fn create_files_table(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Size")]
            size: String,

            #[tabled(rename = "Compressed")]
            compressed: String,
        }

        let mut files: Vec<&FileReportInfo> = report.file_details.iter().collect();
        files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        if files.len() > 15 {
            files.truncate(10);
        }

        let rows: Vec<FileRow> = files
            .iter()
            .map(|info| FileRow {
                path: self.format_path(&info.path, 60),
                size: format_file_size(info.size),
                compressed: if info.compressed { "yes" } else { "" }.to_string(),
            })
            .collect();

        Self::style(&mut Table::new(rows))
    }

    fn generate_console_report(&self, report: &ScanReport) -> String {
        let summary_table = self.create_summary_table(report);
        let files_table = self.create_files_table(report);

        let summary_title = "✅  EXTRACTION COMPLETE";
        let files_title = if report.file_details.len() > 15 {
            "📋  TOP 10 LARGEST FILES"
        } else {
            "📋  PROCESSED FILES"
        };

        format!(
            "{}\n{}\n\n{}\n{}",
            files_title, files_table, summary_title, summary_table
        )
    }
}
