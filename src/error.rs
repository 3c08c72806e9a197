//! Global error handling for repoxml
//!
//! Only configuration and root-path problems are fatal. Anything that goes
//! wrong with a single entry during a run is absorbed by the processor and
//! shows up in the skip counters instead of here.

use std::io;
use thiserror::Error;

/// Global error type for repoxml operations
#[derive(Error, Debug)]
pub enum RepoXmlError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A pattern that could not be compiled
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Content compaction or expansion failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// XML processing errors
    #[error("XML error: {0}")]
    Xml(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Specialized Result type for repoxml operations
pub type Result<T> = std::result::Result<T, RepoXmlError>;

/// Creates a RepoXmlError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::RepoXmlError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

impl From<base64::DecodeError> for RepoXmlError {
    fn from(err: base64::DecodeError) -> Self {
        RepoXmlError::Compression(err.to_string())
    }
}

// Lets the binary return io::Result from main
impl From<RepoXmlError> for io::Error {
    fn from(err: RepoXmlError) -> Self {
        io::Error::new(io::ErrorKind::Other, err.to_string())
    }
}
