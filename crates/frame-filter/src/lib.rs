//! Message Log Frame Filter
//!
//! Reads raw vehicle-bus message logs (`timestamp,*,id,payload...`), keeps only
//! frames whose identifier is on the allowlist and rewrites each kept frame as a
//! single `timestamp,id,data` row with the payload bytes joined into one hex string.

mod config;
mod error;
mod filter;
mod frame;
mod io;

pub use config::{FilterConfig, RowPolicy};
pub use error::FilterError;
pub use filter::{FilterSummary, FrameFilter};
pub use frame::{NormalizedRecord, RawFrame};
pub use io::filter_file;

/// Header written at the top of every filtered output file
pub const OUTPUT_HEADER: [&str; 3] = ["timestamp", "id", "data"];

/// Minimum number of fields a raw row needs to carry an identifier
pub const MIN_FIELDS: usize = 3;

/// Characters that would split an output row if left in a payload
pub const ROW_DELIMITERS: [char; 3] = [',', '\n', '\r'];
