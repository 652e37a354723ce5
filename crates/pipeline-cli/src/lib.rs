//! Message Log Pipeline Front End
//!
//! Wires configuration, logging and the filter/partition crates together for
//! the `canlog-pipeline` binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use frame_filter::{filter_file, FilterConfig, FilterSummary, RowPolicy};
use series_partitioner::{read_decoded, Series, SeriesSet, TimestampPolicy};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG: &str = "canlog";

/// Prefix for environment overrides, e.g. `CANLOG_INPUT_PATH`
pub const ENV_PREFIX: &str = "CANLOG";

/// Initialize logging
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Load the filter config from file and environment
///
/// An explicit `path` must exist; otherwise `canlog.{toml,yaml,json}` is used
/// when present. Environment variables win over the file.
pub fn load_filter_config(path: Option<&Path>) -> Result<FilterConfig> {
    load_layered(path, DEFAULT_CONFIG)
}

fn load_layered(path: Option<&Path>, default_name: &str) -> Result<FilterConfig> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(default_name).required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()
        .context("Failed to load configuration")?;

    settings
        .try_deserialize()
        .context("Invalid filter configuration")
}

/// Command-line overrides for a filter pass
#[derive(Debug, Clone, Default)]
pub struct FilterOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub ids: Vec<String>,
    pub strict: bool,
}

impl FilterOverrides {
    /// Apply on top of a loaded config; given ids replace the allowlist
    pub fn apply(self, mut config: FilterConfig) -> FilterConfig {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if !self.ids.is_empty() {
            config.allowed_ids = self.ids.into_iter().collect();
        }
        if self.strict {
            config.row_policy = RowPolicy::Strict;
        }
        config
    }
}

/// Run a filter pass, attaching the paths to any failure
pub fn run_filter(config: &FilterConfig) -> Result<FilterSummary> {
    info!(
        "Filtering {} for ids {:?}",
        config.input_path.display(),
        config.allowed_ids
    );
    filter_file(config).with_context(|| {
        format!(
            "Filter pass {} -> {} failed",
            config.input_path.display(),
            config.output_path.display()
        )
    })
}

/// One-line summary of a filter pass
pub fn describe_summary(config: &FilterConfig, summary: &FilterSummary) -> String {
    format!(
        "{} rows read, {} retained, {} rejected, {} malformed -> {}",
        summary.rows_read,
        summary.rows_retained,
        summary.rows_rejected,
        summary.rows_malformed,
        config.output_path.display()
    )
}

/// Read a decoded file and keep only the requested labels (all if empty)
pub fn load_series(input: &Path, labels: &[String], policy: TimestampPolicy) -> Result<SeriesSet> {
    let set = read_decoded(input, policy)
        .with_context(|| format!("Failed to partition {}", input.display()))?;

    if labels.is_empty() {
        return Ok(set);
    }
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    Ok(set.select(&labels))
}

/// One-line description of a series
pub fn describe_series(series: &Series) -> String {
    let span = match series.time_span() {
        Some((start, end)) => format!("{} .. {}", start.to_rfc3339(), end.to_rfc3339()),
        None => "-".to_string(),
    };
    let range = match series.value_range() {
        Some((lo, hi)) => format!("{} .. {}", lo, hi),
        None => "-".to_string(),
    };
    format!(
        "{} [{}]: {} points, time {}, value {}",
        series.label(),
        series.unit(),
        series.len(),
        span,
        range
    )
}

/// Render a series set as text lines or JSON
pub fn render_series(set: &SeriesSet, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(set).context("Failed to serialize series");
    }

    let mut lines: Vec<String> = set.iter().map(describe_series).collect();
    if let Some((start, end)) = set.time_span() {
        lines.push(format!("shared axis: {} .. {}", start.to_rfc3339(), end.to_rfc3339()));
    }
    if set.skipped() > 0 {
        lines.push(format!("{} records skipped", set.skipped()));
    }
    Ok(lines.join("\n"))
}
