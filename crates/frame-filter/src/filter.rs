//! Allowlist filter for raw frames

use std::collections::HashSet;
use tracing::debug;

use crate::{FilterConfig, FilterError, NormalizedRecord, RawFrame, RowPolicy};

/// Row counts for one filter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Rows seen in the input
    pub rows_read: u64,
    /// Rows written to the output
    pub rows_retained: u64,
    /// Rows dropped for having fewer than 3 fields or a delimiter in the payload
    pub rows_malformed: u64,
    /// Rows dropped because the identifier is not on the allowlist
    pub rows_rejected: u64,
}

/// Stateful filter for one pass over a message log
pub struct FrameFilter {
    allowed_ids: HashSet<String>,
    policy: RowPolicy,
    trim_payload: bool,
    summary: FilterSummary,
}

impl FrameFilter {
    /// Create a filter from a validated config
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        config.validate()?;
        Ok(Self {
            allowed_ids: config.allowed_ids.iter().cloned().collect(),
            policy: config.row_policy,
            trim_payload: config.trim_payload,
            summary: FilterSummary::default(),
        })
    }

    /// Apply the allowlist to a parsed frame
    pub fn admit(&self, frame: RawFrame) -> Option<NormalizedRecord> {
        if !self.allowed_ids.contains(&frame.identifier) {
            return None;
        }

        let hex_payload = if self.trim_payload {
            frame
                .payload_fields
                .iter()
                .map(|f| f.trim_matches(|c: char| c.is_ascii_whitespace()))
                .collect::<String>()
        } else {
            frame.hex_payload()
        };

        Some(NormalizedRecord {
            timestamp: frame.timestamp,
            identifier: frame.identifier,
            hex_payload,
        })
    }

    /// Process one raw row (1-based `line` for diagnostics)
    pub fn process<I, S>(&mut self, line: u64, fields: I) -> Result<Option<NormalizedRecord>, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summary.rows_read += 1;

        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let field_count = fields.len();

        let Some(frame) = RawFrame::from_fields(fields) else {
            let err = FilterError::MalformedRow {
                line,
                fields: field_count,
            };
            return self.drop_malformed(err).map(|_| None);
        };

        match self.admit(frame) {
            Some(record) if record.has_delimiter() => {
                self.drop_malformed(FilterError::DelimiterInPayload { line })?;
                Ok(None)
            }
            Some(record) => {
                self.summary.rows_retained += 1;
                Ok(Some(record))
            }
            None => {
                self.summary.rows_rejected += 1;
                Ok(None)
            }
        }
    }

    /// Account for a row whose bytes could not be decoded into fields
    pub fn process_unreadable(&mut self, line: u64) -> Result<(), FilterError> {
        self.summary.rows_read += 1;
        self.drop_malformed(FilterError::MalformedRow { line, fields: 0 })
    }

    fn drop_malformed(&mut self, err: FilterError) -> Result<(), FilterError> {
        match self.policy {
            RowPolicy::Lenient => {
                self.summary.rows_malformed += 1;
                debug!("Dropping row: {}", err);
                Ok(())
            }
            RowPolicy::Strict => Err(err),
        }
    }

    /// Filter a batch of rows held in memory
    pub fn filter_rows<I, R, S>(&mut self, rows: I) -> Result<Vec<NormalizedRecord>, FilterError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut records = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            if let Some(record) = self.process(index as u64 + 1, row)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Counts accumulated so far
    pub fn summary(&self) -> FilterSummary {
        self.summary
    }
}
