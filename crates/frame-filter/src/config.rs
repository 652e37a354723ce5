//! Filter configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::FilterError;

/// What to do with rows too short to carry an identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Drop the row, count it and keep going
    #[default]
    Lenient,
    /// Abort the pass on the first short row
    Strict,
}

/// Filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Raw message log to read
    pub input_path: PathBuf,

    /// Where the filtered log is written
    pub output_path: PathBuf,

    /// Identifiers to keep (exact, case-sensitive match)
    pub allowed_ids: BTreeSet<String>,

    /// Handling of malformed rows
    pub row_policy: RowPolicy,

    /// Strip surrounding whitespace from payload fields before joining
    pub trim_payload: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("messages.csv"),
            output_path: PathBuf::from("filtered_output.csv"),
            allowed_ids: ["d7", "101"].into_iter().map(String::from).collect(),
            row_policy: RowPolicy::Lenient,
            trim_payload: false,
        }
    }
}

impl FilterConfig {
    /// Create a config for the given paths and identifiers
    pub fn new<I, S>(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            allowed_ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Switch to the strict row policy
    pub fn strict(mut self) -> Self {
        self.row_policy = RowPolicy::Strict;
        self
    }

    /// Check the config can drive a pass
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.allowed_ids.is_empty() {
            return Err(FilterError::EmptyAllowlist);
        }
        Ok(())
    }
}
