use std::path::PathBuf;

use cacheline_usage::chart::{chart_path, render_distribution_chart};
use cacheline_usage::config::{DEFAULT_LINE_SIZE, SimConfig};
use cacheline_usage::distribution::write_distribution_file;
use cacheline_usage::hotspots::{rank_hotspots, write_hotspots_file};
use cacheline_usage::logging::setup_logger;
use cacheline_usage::pipeline::{analyze_trace, distribution_from_report};
use cacheline_usage::summary::summarize;
use cacheline_usage::usage_report::write_usage_report_file;
use clap::Parser;

/// Byte-level cache line usage of a memory-access trace.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Trace log to analyze
    #[arg(short, long)]
    trace: PathBuf,

    /// First-level (per byte) report to write
    #[arg(short, long)]
    usage_report: PathBuf,

    /// Unused-percentage distribution CSV to write
    #[arg(short, long)]
    distribution: PathBuf,

    /// Cache line size in bytes, at most 4096
    #[arg(long, default_value_t = DEFAULT_LINE_SIZE)]
    line_size: u64,

    /// Skip rendering the distribution chart
    #[arg(long)]
    no_chart: bool,

    /// Also write ranked hotspots to this CSV
    #[arg(long)]
    hotspots: Option<PathBuf>,

    /// Number of hotspots to keep, -1 for all
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    top_n: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger();
    let args = Args::parse();
    let config = SimConfig::new(args.line_size)?;

    let usage = analyze_trace(&args.trace, config)?;
    write_usage_report_file(&usage, &args.usage_report)?;

    if let Some(path) = &args.hotspots {
        let hotspots = rank_hotspots(summarize(&usage), args.top_n);
        write_hotspots_file(&hotspots, path)?;
    }

    let distribution = distribution_from_report(&args.usage_report)?;
    write_distribution_file(&distribution, &args.distribution)?;
    if !args.no_chart {
        render_distribution_chart(&distribution.bucket_counts(), &chart_path(&args.distribution))?;
    }
    Ok(())
}
