//! Partition Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or partitioning decoded records
#[derive(Debug, Error)]
pub enum PartitionError {
    /// Decoded file could not be opened
    #[error("Cannot open decoded file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Decoded file could not be read
    #[error("Cannot read decoded file {}: {source}", .path.display())]
    Read { path: PathBuf, source: csv::Error },

    /// Decoded file could not be written
    #[error("Cannot write decoded file {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },

    /// Timestamp is not a valid integer epoch second
    #[error("Invalid timestamp {value:?} at line {line}")]
    TimestampParse { line: u64, value: String },

    /// Record has the wrong shape or a non-numeric value
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },
}
