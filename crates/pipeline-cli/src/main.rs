//! canlog-pipeline: filter raw message logs and rebuild measurement series

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pipeline_cli::{
    describe_summary, init_logging, load_filter_config, load_series, render_series, run_filter,
    FilterOverrides,
};
use series_partitioner::TimestampPolicy;
use tracing::info;

#[derive(Parser)]
#[command(name = "canlog-pipeline")]
#[command(about = "Filter vehicle-bus message logs and rebuild per-label series")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep allowlisted identifiers and join their payload fields
    Filter {
        /// Config file (defaults to ./canlog.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Raw message log
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Filtered output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Identifier to keep (repeatable, replaces the configured allowlist)
        #[arg(long = "id")]
        ids: Vec<String>,

        /// Fail on the first malformed row instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Partition a decoded file into per-label series
    Series {
        /// Decoded file (`timestamp,id,label,value,unit`, no header)
        #[arg(short, long)]
        input: PathBuf,

        /// Label to include (repeatable, all labels when omitted)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Fail on the first invalid record instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Print the series as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    info!("=== canlog-pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Filter {
            config,
            input,
            output,
            ids,
            strict,
        } => {
            let overrides = FilterOverrides {
                input,
                output,
                ids,
                strict,
            };
            let config = overrides.apply(load_filter_config(config.as_deref())?);
            let summary = run_filter(&config)?;
            println!("{}", describe_summary(&config, &summary));
        }
        Commands::Series {
            input,
            labels,
            strict,
            json,
        } => {
            let policy = if strict {
                TimestampPolicy::Strict
            } else {
                TimestampPolicy::Skip
            };
            let set = load_series(&input, &labels, policy)?;
            println!("{}", render_series(&set, json)?);
        }
    }

    Ok(())
}
