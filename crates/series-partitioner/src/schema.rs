//! Decoded record schema
//!
//! Contract between the external payload decoder and the partitioner: one
//! headerless CSV row per measurement, columns in [`DECODED_COLUMNS`] order.
//! Timestamps are integer seconds since the Unix epoch, always read as UTC.

use std::path::Path;

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::PartitionError;

/// Column order of a decoded row
pub const DECODED_COLUMNS: [&str; 5] = ["timestamp", "id", "label", "value", "unit"];

/// One decoded measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// Seconds since the Unix epoch (UTC)
    pub timestamp: i64,
    /// Message identifier the value was decoded from
    #[serde(rename = "id")]
    pub identifier: String,
    /// Measurement name, e.g. `CylinderPressure`
    pub label: String,
    /// Value in physical units
    pub value: f64,
    /// Physical unit, e.g. `Mpa`
    pub unit: String,
}

impl DecodedRecord {
    /// Create a decoded record
    pub fn new(
        timestamp: i64,
        identifier: impl Into<String>,
        label: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            identifier: identifier.into(),
            label: label.into(),
            value,
            unit: unit.into(),
        }
    }

    /// Parse the fields of one decoded row
    pub fn from_fields(line: u64, fields: &[&str]) -> Result<Self, PartitionError> {
        let [timestamp, identifier, label, value, unit] = fields else {
            return Err(PartitionError::MalformedRecord {
                line,
                reason: format!(
                    "expected {} columns, found {}",
                    DECODED_COLUMNS.len(),
                    fields.len()
                ),
            });
        };

        let timestamp = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| PartitionError::TimestampParse {
                line,
                value: timestamp.to_string(),
            })?;

        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| PartitionError::MalformedRecord {
                line,
                reason: format!("value {:?} is not numeric", value),
            })?;

        Ok(Self::new(timestamp, *identifier, *label, value, *unit))
    }
}

/// Convert epoch seconds to a UTC instant
pub fn epoch_to_utc(line: u64, secs: i64) -> Result<DateTime<Utc>, PartitionError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| PartitionError::TimestampParse {
        line,
        value: secs.to_string(),
    })
}

/// Write records in the decoded schema (no header row)
pub fn write_decoded<'a, I>(path: &Path, records: I) -> Result<(), PartitionError>
where
    I: IntoIterator<Item = &'a DecodedRecord>,
{
    let write_err = |source: csv::Error| PartitionError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_err)?;

    for record in records {
        writer.serialize(record).map_err(write_err)?;
    }

    writer.flush().map_err(|e| write_err(e.into()))
}
