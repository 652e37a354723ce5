//! Per-label series

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Samples of one measurement in arrival order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    label: String,
    unit: String,
    points: Vec<(DateTime<Utc>, f64)>,
}

impl Series {
    /// Create an empty series
    pub fn new(label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
            points: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Unit of the first record seen for this label
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// `(time, value)` pairs, never re-sorted
    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&(DateTime<Utc>, f64)> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&(DateTime<Utc>, f64)> {
        self.points.last()
    }

    /// Smallest and largest value, for axis scaling
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().map(|(_, v)| *v);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Earliest and latest sample time
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut times = self.points.iter().map(|(t, _)| *t);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    pub(crate) fn push(&mut self, time: DateTime<Utc>, value: f64) {
        self.points.push((time, value));
    }
}

/// All series from one partition pass, keyed by label
///
/// Iteration follows the order in which labels were first seen.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesSet {
    series: Vec<Series>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    skipped: u64,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Series for `label`, if any record carried it
    pub fn get(&self, label: &str) -> Option<&Series> {
        self.index.get(label).map(|&i| &self.series[i])
    }

    /// Labels in first-seen order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(Series::label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Records dropped under the skip policy
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Subset to draw on one shared time axis, in the requested order
    ///
    /// Labels with no data are left out.
    pub fn select(&self, labels: &[&str]) -> SeriesSet {
        let mut selected = SeriesSet::new();
        for label in labels {
            if selected.index.contains_key(*label) {
                continue;
            }
            if let Some(series) = self.get(label) {
                selected.insert(series.clone());
            }
        }
        selected
    }

    /// Time range covering every series in the set
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.series
            .iter()
            .filter_map(Series::time_span)
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }

    /// Series for `label`, created with `unit` on first sight
    pub(crate) fn entry(&mut self, label: &str, unit: &str) -> &mut Series {
        let i = match self.index.get(label) {
            Some(&i) => i,
            None => self.insert(Series::new(label, unit)),
        };
        &mut self.series[i]
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped += 1;
    }

    fn insert(&mut self, series: Series) -> usize {
        let i = self.series.len();
        self.index.insert(series.label.clone(), i);
        self.series.push(series);
        i
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = &'a Series;
    type IntoIter = std::slice::Iter<'a, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
