//! Record-to-series partitioning

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::schema::epoch_to_utc;
use crate::{DecodedRecord, PartitionError, SeriesSet};

/// What to do with a record whose timestamp or shape is invalid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Abort the whole pass
    Strict,
    /// Drop the record, count it and continue
    #[default]
    Skip,
}

/// Incremental partitioner for one pass
pub struct Partitioner {
    policy: TimestampPolicy,
    set: SeriesSet,
    unit_conflicts: HashSet<String>,
}

impl Partitioner {
    pub fn new(policy: TimestampPolicy) -> Self {
        Self {
            policy,
            set: SeriesSet::new(),
            unit_conflicts: HashSet::new(),
        }
    }

    /// Parse and append one raw decoded row
    pub fn push_row(&mut self, line: u64, fields: &[&str]) -> Result<(), PartitionError> {
        match DecodedRecord::from_fields(line, fields) {
            Ok(record) => self.push(line, record),
            Err(err) => self.reject(err),
        }
    }

    /// Append one record to the series for its label
    pub fn push(&mut self, line: u64, record: DecodedRecord) -> Result<(), PartitionError> {
        let time = match epoch_to_utc(line, record.timestamp) {
            Ok(time) => time,
            Err(err) => return self.reject(err),
        };

        let series = self.set.entry(&record.label, &record.unit);
        if series.unit() != record.unit && self.unit_conflicts.insert(record.label.clone()) {
            debug!(
                "Label {} seen with unit {} after {}; keeping {}",
                record.label,
                record.unit,
                series.unit(),
                series.unit()
            );
        }
        series.push(time, record.value);
        Ok(())
    }

    /// Apply the policy to a bad record
    pub fn reject(&mut self, err: PartitionError) -> Result<(), PartitionError> {
        match self.policy {
            TimestampPolicy::Strict => Err(err),
            TimestampPolicy::Skip => {
                warn!("Skipping record: {}", err);
                self.set.record_skip();
                Ok(())
            }
        }
    }

    pub fn finish(self) -> SeriesSet {
        self.set
    }
}

/// Partition already-decoded records (line numbers are 1-based positions)
pub fn partition<I>(records: I, policy: TimestampPolicy) -> Result<SeriesSet, PartitionError>
where
    I: IntoIterator<Item = DecodedRecord>,
{
    let mut partitioner = Partitioner::new(policy);
    for (index, record) in records.into_iter().enumerate() {
        partitioner.push(index as u64 + 1, record)?;
    }
    Ok(partitioner.finish())
}

/// Read a decoded CSV file and partition it
pub fn read_decoded(path: &Path, policy: TimestampPolicy) -> Result<SeriesSet, PartitionError> {
    let file = File::open(path).map_err(|source| PartitionError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut partitioner = Partitioner::new(policy);
    let mut record = StringRecord::new();
    let mut rows = 0u64;
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if err.is_io_error() => {
                return Err(PartitionError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                rows += 1;
                let line = err.position().map_or(0, |p| p.line());
                partitioner.reject(PartitionError::MalformedRecord {
                    line,
                    reason: err.to_string(),
                })?;
                continue;
            }
        }

        rows += 1;
        let line = record.position().map_or(0, |p| p.line());
        let fields: Vec<&str> = record.iter().collect();
        partitioner.push_row(line, &fields)?;
    }

    let set = partitioner.finish();
    info!(
        "Partitioned {}: {} rows into {} series ({} skipped)",
        path.display(),
        rows,
        set.len(),
        set.skipped()
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write_decoded;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn secs(set: &SeriesSet, label: &str) -> Vec<(i64, f64)> {
        set.get(label)
            .unwrap()
            .points()
            .iter()
            .map(|(t, v)| (t.timestamp(), *v))
            .collect()
    }

    #[test]
    fn test_example_stream() {
        let records = vec![
            DecodedRecord::new(10, "d7", "Speed", 50.0, "km/h"),
            DecodedRecord::new(11, "101", "Pressure", 2.1, "Mpa"),
            DecodedRecord::new(12, "d7", "Speed", 55.0, "km/h"),
        ];

        let set = partition(records, TimestampPolicy::Strict).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(secs(&set, "Speed"), vec![(10, 50.0), (12, 55.0)]);
        assert_eq!(set.get("Speed").unwrap().unit(), "km/h");
        assert_eq!(secs(&set, "Pressure"), vec![(11, 2.1)]);
        assert_eq!(set.get("Pressure").unwrap().unit(), "Mpa");
    }

    #[test]
    fn test_first_unit_wins() {
        let records = vec![
            DecodedRecord::new(1, "d7", "Speed", 50.0, "km/h"),
            DecodedRecord::new(2, "d7", "Speed", 31.0, "mph"),
            DecodedRecord::new(3, "d7", "Speed", 52.0, "mph"),
        ];

        let set = partition(records, TimestampPolicy::Strict).unwrap();
        let speed = set.get("Speed").unwrap();
        assert_eq!(speed.unit(), "km/h");
        assert_eq!(speed.len(), 3);
    }

    #[test]
    fn test_arrival_order_not_resorted() {
        let records = vec![
            DecodedRecord::new(20, "d7", "Speed", 1.0, "km/h"),
            DecodedRecord::new(10, "d7", "Speed", 2.0, "km/h"),
        ];

        let set = partition(records, TimestampPolicy::Strict).unwrap();
        assert_eq!(secs(&set, "Speed"), vec![(20, 1.0), (10, 2.0)]);
    }

    #[test]
    fn test_strict_aborts_on_bad_timestamp() {
        let mut partitioner = Partitioner::new(TimestampPolicy::Strict);
        partitioner.push_row(1, &["10", "d7", "Speed", "50", "km/h"]).unwrap();
        let err = partitioner
            .push_row(2, &["soon", "d7", "Speed", "55", "km/h"])
            .unwrap_err();
        assert!(matches!(err, PartitionError::TimestampParse { line: 2, .. }));
    }

    #[test]
    fn test_skip_drops_bad_records() {
        let mut partitioner = Partitioner::new(TimestampPolicy::Skip);
        partitioner.push_row(1, &["10", "d7", "Speed", "50", "km/h"]).unwrap();
        partitioner.push_row(2, &["soon", "d7", "Speed", "55", "km/h"]).unwrap();
        partitioner.push_row(3, &["12", "d7", "Speed"]).unwrap();
        partitioner
            .push(4, DecodedRecord::new(i64::MAX, "d7", "Speed", 1.0, "km/h"))
            .unwrap();
        partitioner.push_row(5, &["13", "d7", "Speed", "60", "km/h"]).unwrap();

        let set = partitioner.finish();
        assert_eq!(set.skipped(), 3);
        assert_eq!(secs(&set, "Speed"), vec![(10, 50.0), (13, 60.0)]);
    }

    #[test]
    fn test_default_policy_keeps_going() {
        assert_eq!(TimestampPolicy::default(), TimestampPolicy::Skip);

        let mut partitioner = Partitioner::new(TimestampPolicy::default());
        partitioner.push_row(1, &["noise"]).unwrap();
        partitioner.push_row(2, &["10", "d7", "Speed", "50", "km/h"]).unwrap();

        let set = partitioner.finish();
        assert_eq!(set.skipped(), 1);
        assert_eq!(set.get("Speed").unwrap().len(), 1);
    }

    #[test]
    fn test_strict_rejects_out_of_range_epoch() {
        let records = vec![DecodedRecord::new(i64::MIN, "d7", "Speed", 1.0, "km/h")];
        let err = partition(records, TimestampPolicy::Strict).unwrap_err();
        assert!(matches!(err, PartitionError::TimestampParse { line: 1, .. }));
    }

    #[test]
    fn test_read_decoded_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("decoded.csv");
        fs::write(
            &path,
            "1752829805,d7,CylinderPressure,2.1,Mpa\n\
             1752829805,101,VehicleSpeed,48,km/h\n\
             1752829806,d7,CylinderPressure,2.4,Mpa\n",
        )
        .unwrap();

        let set = read_decoded(&path, TimestampPolicy::Strict).unwrap();
        let labels: Vec<_> = set.labels().collect();
        assert_eq!(labels, vec!["CylinderPressure", "VehicleSpeed"]);
        assert_eq!(
            secs(&set, "CylinderPressure"),
            vec![(1752829805, 2.1), (1752829806, 2.4)]
        );
    }

    #[test]
    fn test_read_decoded_strict_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("decoded.csv");
        fs::write(&path, "10,d7,Speed,50,km/h\nbad,d7,Speed,55,km/h\n").unwrap();

        let err = read_decoded(&path, TimestampPolicy::Strict).unwrap_err();
        assert!(matches!(err, PartitionError::TimestampParse { line: 2, .. }));

        let set = read_decoded(&path, TimestampPolicy::Skip).unwrap();
        assert_eq!(set.skipped(), 1);
        assert_eq!(set.get("Speed").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_decoded(&dir.path().join("decoded.csv"), TimestampPolicy::Skip).unwrap_err();
        assert!(matches!(err, PartitionError::Open { .. }));
    }

    #[test]
    fn test_write_then_read_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("decoded.csv");
        let records = vec![
            DecodedRecord::new(10, "d7", "Speed", 50.0, "km/h"),
            DecodedRecord::new(11, "101", "Pressure", 2.1, "Mpa"),
        ];
        write_decoded(&path, &records).unwrap();

        let set = read_decoded(&path, TimestampPolicy::Strict).unwrap();
        assert_eq!(secs(&set, "Pressure"), vec![(11, 2.1)]);
        assert_eq!(set.get("Speed").unwrap().unit(), "km/h");
    }

    #[test]
    fn test_series_serialize() {
        let records = vec![DecodedRecord::new(0, "d7", "Speed", 50.0, "km/h")];
        let set = partition(records, TimestampPolicy::Strict).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["series"][0]["label"], "Speed");
        assert_eq!(json["series"][0]["unit"], "km/h");
        assert_eq!(json["series"][0]["points"][0][0], "1970-01-01T00:00:00Z");
        assert_eq!(json["skipped"], 0);
    }

    fn record() -> impl Strategy<Value = DecodedRecord> {
        (
            0i64..2_000_000_000,
            prop::sample::select(vec!["Speed", "Pressure", "Rpm"]),
            -1000.0f64..1000.0,
            prop::sample::select(vec!["km/h", "Mpa", "rpm"]),
        )
            .prop_map(|(ts, label, value, unit)| DecodedRecord::new(ts, "d7", label, value, unit))
    }

    proptest! {
        #[test]
        fn prop_one_point_per_record_in_order(records in prop::collection::vec(record(), 0..60)) {
            let set = partition(records.clone(), TimestampPolicy::Strict).unwrap();

            let total: usize = set.iter().map(|s| s.len()).sum();
            prop_assert_eq!(total, records.len());

            for series in &set {
                let expected: Vec<(i64, f64)> = records
                    .iter()
                    .filter(|r| r.label == series.label())
                    .map(|r| (r.timestamp, r.value))
                    .collect();
                let actual: Vec<(i64, f64)> = series
                    .points()
                    .iter()
                    .map(|(t, v)| (t.timestamp(), *v))
                    .collect();
                prop_assert_eq!(actual, expected);

                let first_unit = records
                    .iter()
                    .find(|r| r.label == series.label())
                    .map(|r| r.unit.as_str());
                prop_assert_eq!(Some(series.unit()), first_unit);
            }
        }
    }
}
