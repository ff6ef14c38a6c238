use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the analysis engine.
///
/// Recoverable conditions (unparseable lines, orphan logouts, one failed
/// source among several) never surface here; they are counted into the run
/// summary instead.
#[derive(Error, Debug)]
pub enum InsightError {
    /// A log source could not be opened or read.
    #[error("Failed to read source {path}: {source}")]
    SourceAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source pattern is not a valid glob.
    #[error("Invalid source pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// No files matched any of the given source patterns.
    #[error("No log files found for: {0}")]
    NoSources(String),

    /// Zero events were parsed across all sources. Usually a wrong path or
    /// a format mismatch, so it is surfaced instead of producing
    /// empty-but-valid output.
    #[error("No log events parsed from any source")]
    EmptyResult,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the insight crates.
pub type Result<T> = std::result::Result<T, InsightError>;
