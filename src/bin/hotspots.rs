use std::path::PathBuf;

use cacheline_usage::hotspots::write_hotspots_file;
use cacheline_usage::logging::setup_logger;
use cacheline_usage::pipeline::hotspots_from_report;
use clap::Parser;

/// Ranks the cache lines of a first-level usage report by wasted bytes
/// times accesses.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// First-level report written by `clusage`
    #[arg(short, long)]
    report: PathBuf,

    /// Ranked CSV to write
    #[arg(short, long)]
    output: PathBuf,

    /// Number of cache lines to keep, -1 for all
    #[arg(short = 'n', long, default_value_t = -1, allow_hyphen_values = true)]
    top_n: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger();
    let args = Args::parse();
    let hotspots = hotspots_from_report(&args.report, args.top_n)?;
    write_hotspots_file(&hotspots, &args.output)?;
    Ok(())
}
