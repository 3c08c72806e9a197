/*!
 * Utility functions for repoxml
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::bail;
use crate::classify;
use crate::config::{to_strings, Config};
use crate::error::Result;
use crate::walker::{TreeWalker, WalkItem};

/// Count the file entries a run will visit, for progress tracking
pub fn count_files(dir: &Path, config: &Config) -> Result<u64> {
    let walker = TreeWalker::new(dir, config.compile_rules()?);
    Ok(walker.walk().count() as u64)
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

/// Lowercased extensions of every file under `root`, skipping the default
/// excluded directories
pub fn scan_project_extensions(root: &Path) -> Result<BTreeSet<String>> {
    let config = Config {
        exclude_files: Vec::new(),
        include_files: Vec::new(),
        ..Config::default()
    };
    let walker = TreeWalker::new(root, config.compile_rules()?);

    let extensions = walker
        .walk()
        .filter_map(|item| match item {
            WalkItem::Candidate(path) => path.extension().map(|e| e.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect();

    Ok(extensions)
}

/// Build a starter configuration tailored to the extensions found in `root`
pub fn generate_config(root: &Path) -> Result<Config> {
    let include_files = scan_project_extensions(root)?
        .into_iter()
        .filter(|ext| !classify::has_binary_extension(Path::new(&format!("x.{}", ext))))
        .map(|ext| format!("*.{}", ext))
        .collect();

    Ok(Config {
        exclude_dirs: to_strings(&[
            ".git",
            "node_modules",
            ".svelte-kit",
            "build",
            "dist",
            "coverage",
            ".turbo",
            ".next",
            ".cache",
            "target",
        ]),
        exclude_files: to_strings(&[
            "pnpm-lock.yaml",
            "package-lock.json",
            "yarn.lock",
            ".DS_Store",
            "Thumbs.db",
            ".env",
            ".env.*",
            "*.log",
            "vite.config.js.timestamp-*",
            "vite.config.ts.timestamp-*",
            "*.map",
            "*.min.js",
            "*.min.css",
            "LICENSE",
            "LICENSE.*",
            "*.md",
            "*.lock",
        ]),
        include_files,
        max_file_size: 512 * 1024,
        min_file_size: 0,
        compress_content: true,
        compression_threshold: 1024,
        ..Config::default()
    })
}

/// Write a config file, refusing to replace an existing one unless forced
pub fn write_config(config: &Config, output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            InvalidArgument,
            "config file already exists at {} (use --force to overwrite)",
            output.display()
        );
    }

    fs::write(output, config.to_json_pretty()? + "\n")?;
    Ok(())
}
