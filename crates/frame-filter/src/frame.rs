//! Raw and normalized frame records

use serde::{Deserialize, Serialize};

use crate::{MIN_FIELDS, ROW_DELIMITERS};

/// One line of the raw message log
///
/// Layout is `timestamp,*,identifier,payload0,payload1,...`. The second column
/// is not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Timestamp exactly as logged
    pub timestamp: String,
    /// Message identifier token
    pub identifier: String,
    /// Payload tokens in logged order (may be empty)
    pub payload_fields: Vec<String>,
}

impl RawFrame {
    /// Build a frame from the fields of one row, `None` if fewer than 3 fields
    pub fn from_fields<I, S>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        let payload_fields = fields.split_off(MIN_FIELDS);
        let [timestamp, _channel, identifier]: [String; MIN_FIELDS] = fields.try_into().ok()?;

        Some(Self {
            timestamp,
            identifier,
            payload_fields,
        })
    }

    /// Join the payload tokens into one hex string, no separators
    pub fn hex_payload(&self) -> String {
        self.payload_fields.concat()
    }
}

/// A kept frame with its payload reassembled
///
/// `hex_payload` never contains a [`ROW_DELIMITERS`] character; frames whose
/// payload fields carry one (quoted in the raw log) are treated as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub timestamp: String,
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(rename = "data")]
    pub hex_payload: String,
}

impl NormalizedRecord {
    /// Whether the payload would reintroduce a row delimiter
    pub fn has_delimiter(&self) -> bool {
        self.hex_payload.contains(&ROW_DELIMITERS[..])
    }

    /// Fields in output column order
    pub fn as_row(&self) -> [&str; 3] {
        [&self.timestamp, &self.identifier, &self.hex_payload]
    }
}
