//! Series Partitioner
//!
//! Turns a stream of decoded measurements (`timestamp,id,label,value,unit`)
//! into independent per-label time series that share a UTC time axis, ready to
//! be drawn against each other by a renderer.

mod error;
mod partitioner;
mod schema;
mod series;

pub use error::PartitionError;
pub use partitioner::{partition, read_decoded, Partitioner, TimestampPolicy};
pub use schema::{epoch_to_utc, write_decoded, DecodedRecord, DECODED_COLUMNS};
pub use series::{Series, SeriesSet};
