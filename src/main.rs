/*!
 * Command-line interface for repoxml
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use repoxml::config::{self, Args, Config, DEFAULT_CONFIG_FILE};
use repoxml::logging::setup_logging;
use repoxml::processor::Processor;
use repoxml::report::{ReportFormat, Reporter, ScanReport};
use repoxml::utils::{count_files, generate_config, write_config};
use repoxml::writer::XmlWriter;

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    setup_logging(if args.verbose { "repoxml=debug" } else { "warn" });

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "repoxml", &mut io::stdout());
        return Ok(());
    }

    if args.init_config {
        let root = config::validate_root(&args.repo_path)?;
        let generated = generate_config(&root)?;
        let output = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        write_config(&generated, &output, args.force)?;
        eprintln!("Generated config file at {}", output.display());
        eprintln!("\nDetected file extensions:");
        for pattern in &generated.include_files {
            eprintln!("  {}", pattern);
        }
        return Ok(());
    }

    let root = config::validate_root(&args.repo_path)?;
    let config = Config::from_args(&args)?;
    if args.verbose {
        eprintln!("Configuration: {:#?}", config);
    }

    // Never pick up a previous output document
    let previous_output = output_inside_root(&root, &args.output);

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress.set_prefix("📊 Processing");
    progress.set_message(format!("📂 Scanning directory: {}", root.display()));

    // Count files for progress tracking
    match count_files(&root, &config) {
        Ok(count) => progress.set_length(count),
        Err(e) => progress.set_message(format!("⚠️ Warning: Failed to count files: {}", e)),
    }

    let mut processor = Processor::new(config)?.with_progress(Arc::new(progress.clone()));
    if let Some(previous) = previous_output {
        processor = processor.skip_path(previous);
    }
    let writer = XmlWriter::new(!args.compact);

    let start_time = Instant::now();
    let result = processor.process(&root)?;

    if args.output == "-" {
        writer.write_to(&result, &mut io::stdout().lock())?;
    } else {
        writer.write(&result, Path::new(&args.output))?;
    }

    let total_duration = start_time.elapsed();
    progress.finish_and_clear();

    let output_name = if args.output == "-" {
        "<stdout>".to_string()
    } else {
        args.output.clone()
    };
    let report = ScanReport::from_result(&result, output_name, total_duration);
    Reporter::new(ReportFormat::ConsoleTable).print_report(&report);

    Ok(())
}

/// Canonical path of an existing output file located under the root
fn output_inside_root(root: &Path, output: &str) -> Option<PathBuf> {
    if output == "-" {
        return None;
    }
    let output = fs::canonicalize(output).ok()?;
    output.starts_with(root).then_some(output)
}
