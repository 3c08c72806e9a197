/*!
 * Configuration handling for repoxml
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::error::{RepoXmlError, Result};
use crate::pattern::PatternSet;
use crate::{bail, ensure};

/// Default output document name
pub const DEFAULT_OUTPUT: &str = "repo.xml";

/// Default config file name written by `--init-config`
pub const DEFAULT_CONFIG_FILE: &str = "repoxml.config.json";

/// Command-line arguments for repoxml
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "repoxml",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serialize a source tree into a single XML document",
    long_about = "Walks a directory tree, selects files by include/exclude rules, optionally compresses large files and writes everything into one XML document with per-file metadata and run statistics."
)]
pub struct Args {
    /// Repository directory to process
    #[clap(default_value = ".")]
    pub repo_path: PathBuf,

    /// Output XML file path, `-` for stdout
    #[clap(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// JSON configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[clap(short, long)]
    pub verbose: bool,

    /// Write the document on a single line instead of pretty-printing it
    #[clap(long)]
    pub compact: bool,

    /// Compress content of large files regardless of the config file
    #[clap(long)]
    pub compress: bool,

    /// Generate a config file for the repository and exit
    #[clap(long)]
    pub init_config: bool,

    /// Overwrite an existing config file with --init-config
    #[clap(long)]
    pub force: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Pipeline configuration, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory name patterns; matching directories are not descended into
    pub exclude_dirs: Vec<String>,

    /// File patterns; a matching file is skipped
    pub exclude_files: Vec<String>,

    /// File patterns; when non-empty a file must match one of them
    pub include_files: Vec<String>,

    /// Largest accepted size in bytes (inclusive)
    pub max_file_size: u64,

    /// Smallest accepted size in bytes (inclusive)
    pub min_file_size: u64,

    /// Keep files classified as binary
    pub include_binary_files: bool,

    /// Compress content longer than `compression_threshold`
    pub compress_content: bool,

    /// Decoded byte length above which content is compressed
    pub compression_threshold: usize,

    /// Whether patterns are matched case-sensitively
    pub case_sensitive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_dirs: to_strings(&[
                ".git",
                "node_modules",
                "target",
                "dist",
                "build",
                ".next",
                ".cache",
            ]),
            exclude_files: to_strings(&[
                ".DS_Store",
                "Thumbs.db",
                "*.lock",
                "*.log",
                "*.map",
                "*.png",
                "*.jpg",
                "*.jpeg",
                "*.gif",
                "*.ico",
                "*.woff",
                "*.woff2",
                "*.ttf",
                "*.eot",
            ]),
            include_files: Vec::new(),
            max_file_size: 1024 * 1024,
            min_file_size: 0,
            include_binary_files: false,
            compress_content: false,
            compression_threshold: 1024,
            case_sensitive: true,
        }
    }
}

pub(crate) fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Parse a JSON document; missing fields fall back to the defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RepoXmlError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Resolve the effective configuration from command-line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };

        if args.compress {
            config.compress_content = true;
        }

        Ok(config)
    }

    /// Pretty JSON suitable for a config file
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_file_size <= self.max_file_size,
            Config,
            "minFileSize ({}) is larger than maxFileSize ({})",
            self.min_file_size,
            self.max_file_size
        );

        for (name, patterns) in [
            ("excludeDirs", &self.exclude_dirs),
            ("excludeFiles", &self.exclude_files),
            ("includeFiles", &self.include_files),
        ] {
            if let Some(empty) = patterns.iter().position(|p| p.is_empty()) {
                bail!(Config, "{}[{}] is an empty pattern", name, empty);
            }
        }

        self.compile_rules()?;
        Ok(())
    }

    /// Compile the pattern lists once for a run
    pub fn compile_rules(&self) -> Result<Rules> {
        Ok(Rules {
            exclude_dirs: PatternSet::with_case(&self.exclude_dirs, self.case_sensitive)?,
            exclude_files: PatternSet::with_case(&self.exclude_files, self.case_sensitive)?,
            include_files: PatternSet::with_case(&self.include_files, self.case_sensitive)?,
            skip_paths: Vec::new(),
        })
    }
}

/// Compiled pattern sets for a configuration
#[derive(Debug, Clone, Default)]
pub struct Rules {
    pub exclude_dirs: PatternSet,
    pub exclude_files: PatternSet,
    pub include_files: PatternSet,
    /// Exact files to leave out, compared as paths rather than patterns
    pub skip_paths: Vec<PathBuf>,
}

/// Check that the repository root exists and is a directory
pub fn validate_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        bail!(PathNotFound, "{}", root.display());
    }
    if !root.is_dir() {
        bail!(NotADirectory, "{}", root.display());
    }

    Ok(fs::canonicalize(root)?)
}
