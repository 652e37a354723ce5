//! Filter Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a filter pass
#[derive(Debug, Error)]
pub enum FilterError {
    /// Allowlist has no identifiers, nothing could ever be retained
    #[error("Identifier allowlist is empty")]
    EmptyAllowlist,

    /// Input log could not be opened
    #[error("Cannot open input {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input log could not be read
    #[error("Cannot read input {}: {source}", .path.display())]
    Read { path: PathBuf, source: csv::Error },

    /// Output file (or its temporary sibling) could not be created
    #[error("Cannot create output {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Output rows could not be written
    #[error("Cannot write output {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },

    /// Finished output could not be moved into place
    #[error("Cannot replace output {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Row too short to carry an identifier (strict policy only)
    #[error("Malformed row at line {line}: {fields} field(s), expected at least {}", crate::MIN_FIELDS)]
    MalformedRow { line: u64, fields: usize },

    /// Payload field carries a row delimiter (strict policy only)
    #[error("Malformed row at line {line}: payload contains a row delimiter")]
    DelimiterInPayload { line: u64 },
}
