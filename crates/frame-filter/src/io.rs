//! File-to-file filter pass
//!
//! The output is staged in a temporary file next to the destination and only
//! moved over `output_path` once every row has been written and flushed. A pass
//! that fails part way leaves any previous output untouched.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use tempfile::NamedTempFile;
use tracing::info;

use crate::{FilterConfig, FilterError, FilterSummary, FrameFilter, OUTPUT_HEADER};

/// Run one filter pass from `config.input_path` to `config.output_path`
pub fn filter_file(config: &FilterConfig) -> Result<FilterSummary, FilterError> {
    let mut filter = FrameFilter::new(config)?;
    let input = &config.input_path;
    let output = &config.output_path;

    let file = File::open(input).map_err(|source| FilterError::Open {
        path: input.clone(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staging = NamedTempFile::new_in(dir).map_err(|source| FilterError::Create {
        path: output.clone(),
        source,
    })?;

    let write_err = |source: csv::Error| FilterError::Write {
        path: output.clone(),
        source,
    };

    let mut writer = Writer::from_writer(staging);
    writer.write_record(OUTPUT_HEADER).map_err(write_err)?;

    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if err.is_io_error() => {
                return Err(FilterError::Read {
                    path: input.clone(),
                    source: err,
                });
            }
            Err(err) => {
                let line = err.position().map_or(0, |p| p.line());
                filter.process_unreadable(line)?;
                continue;
            }
        }

        let line = record.position().map_or(0, |p| p.line());
        if let Some(kept) = filter.process(line, record.iter())? {
            writer.write_record(kept.as_row()).map_err(write_err)?;
        }
    }

    let staging = writer
        .into_inner()
        .map_err(|err| write_err(err.into_error().into()))?;
    staging.persist(output).map_err(|err| FilterError::Persist {
        path: output.clone(),
        source: err.error,
    })?;

    let summary = filter.summary();
    info!(
        "Filtered {} -> {}: {} of {} rows retained ({} rejected, {} malformed)",
        input.display(),
        output.display(),
        summary.rows_retained,
        summary.rows_read,
        summary.rows_rejected,
        summary.rows_malformed
    );

    Ok(summary)
}
