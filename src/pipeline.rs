//! Stage wiring shared by the binaries.
//!
//! Every stage reads its whole input and materializes its whole output before
//! the next one starts.

use std::path::Path;

use tracing::info;

use crate::config::SimConfig;
use crate::distribution::Distribution;
use crate::error::AnalysisError;
use crate::hotspots::rank_hotspots;
use crate::simulator::{CacheUsage, simulate};
use crate::summary::LineSummary;
use crate::trace_record::read_trace;
use crate::usage_report::read_report_summaries;

/// Parses the trace at `path` and folds it into cache line usage.
pub fn analyze_trace(path: &Path, config: SimConfig) -> Result<CacheUsage, AnalysisError> {
    let records = read_trace(path)?;
    let accepted = records.len();
    let usage = simulate(records, config);
    info!(
        accepted,
        lines = usage.lines().len(),
        line_size = config.line_size(),
        "analyzed {}",
        path.display()
    );
    Ok(usage)
}

pub fn distribution_from_report(report: &Path) -> Result<Distribution, AnalysisError> {
    let summaries = read_report_summaries(report)?;
    Ok(Distribution::from_summaries(&summaries))
}

pub fn hotspots_from_report(report: &Path, top_n: i64) -> Result<Vec<LineSummary>, AnalysisError> {
    let summaries = read_report_summaries(report)?;
    info!(lines = summaries.len(), "read {}", report.display());
    Ok(rank_hotspots(summaries, top_n))
}
