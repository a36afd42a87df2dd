use std::collections::HashSet;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::output::{create_file, hex};
use crate::summary::LineSummary;

const HEADER: [&str; 4] = ["Cache Line", "Used Percentage", "Unused Percentage", "Range"];

// lower edges of the ten ranges, followed by the closing upper edge
const BOUNDS: [f64; 11] = [1.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

/// One of the ten unused-percentage ranges: `[1,10)`, `[10,20)` ... `[80,90)`
/// and the closed `[90,100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeBucket(usize);

impl RangeBucket {
    pub const COUNT: usize = BOUNDS.len() - 1;

    pub fn all() -> impl Iterator<Item = RangeBucket> {
        (0..Self::COUNT).map(RangeBucket)
    }

    /// Range containing `percentage`, if any. Below 1% there is none.
    pub fn classify(percentage: f64) -> Option<RangeBucket> {
        let last = Self::COUNT - 1;
        if (BOUNDS[last]..=BOUNDS[Self::COUNT]).contains(&percentage) {
            return Some(RangeBucket(last));
        }
        (0..last)
            .find(|&i| (BOUNDS[i]..BOUNDS[i + 1]).contains(&percentage))
            .map(RangeBucket)
    }

    pub fn lower(&self) -> f64 {
        BOUNDS[self.0]
    }

    pub fn upper(&self) -> f64 {
        BOUNDS[self.0 + 1]
    }

    pub fn label(&self) -> String {
        format!("{:.1}-{:.1}", self.lower(), self.upper())
    }
}

/// Used and unused share of a line in percent. A line of size zero yields `(0, 0)`.
pub fn calculate_percentage(used: u64, unused: u64) -> (f64, f64) {
    // summed as floats, byte totals read back from a report may be arbitrarily large
    let total = used as f64 + unused as f64;
    if total == 0.0 {
        return (0.0, 0.0);
    }
    (
        used as f64 / total * 100.0,
        unused as f64 / total * 100.0,
    )
}

/// Shortest round-trip form, but always with a fractional part (`50.0`, `6.25`).
fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePercentage {
    pub cache_line: u64,
    pub used_percentage: f64,
    pub unused_percentage: f64,
}

/// Lines with unused bytes grouped by unused-percentage range.
#[derive(Debug, Default)]
pub struct Distribution {
    // buckets in the order they were first filled
    buckets: Vec<(RangeBucket, Vec<LinePercentage>)>,
}

impl Distribution {
    /// Buckets every line that has unused bytes. A line id is only ever
    /// counted once.
    pub fn from_summaries(summaries: &[LineSummary]) -> Self {
        let mut distribution = Distribution::default();
        let mut seen = HashSet::new();

        for line in summaries {
            let (used_percentage, unused_percentage) =
                calculate_percentage(line.used_bytes, line.unused_bytes);
            if unused_percentage == 0.0 || !seen.insert(line.cache_line) {
                continue;
            }
            let Some(bucket) = RangeBucket::classify(unused_percentage) else {
                debug!(
                    cache_line = line.cache_line,
                    unused_percentage, "line below the lowest range"
                );
                continue;
            };
            distribution.push(
                bucket,
                LinePercentage {
                    cache_line: line.cache_line,
                    used_percentage,
                    unused_percentage,
                },
            );
        }
        distribution
    }

    fn push(&mut self, bucket: RangeBucket, line: LinePercentage) {
        match self.buckets.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, lines)) => lines.push(line),
            None => self.buckets.push((bucket, vec![line])),
        }
    }

    /// Lines with their range, grouped by range in first-filled order.
    pub fn lines(&self) -> impl Iterator<Item = (RangeBucket, &LinePercentage)> {
        self.buckets
            .iter()
            .flat_map(|(bucket, lines)| lines.iter().map(move |line| (*bucket, line)))
    }

    pub fn line_count(&self) -> usize {
        self.buckets.iter().map(|(_, lines)| lines.len()).sum()
    }

    /// Number of lines per range for every range, lowest range first.
    pub fn bucket_counts(&self) -> Vec<(RangeBucket, usize)> {
        RangeBucket::all()
            .map(|bucket| {
                let count = self
                    .buckets
                    .iter()
                    .find(|(b, _)| *b == bucket)
                    .map_or(0, |(_, lines)| lines.len());
                (bucket, count)
            })
            .collect()
    }
}

pub fn write_distribution<W: io::Write>(
    distribution: &Distribution,
    writer: W,
) -> Result<(), AnalysisError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    writer.write_record(HEADER)?;
    for (bucket, line) in distribution.lines() {
        writer.write_record([
            hex(line.cache_line),
            format_percentage(line.used_percentage),
            format_percentage(line.unused_percentage),
            bucket.label(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_distribution_file(distribution: &Distribution, path: &Path) -> Result<(), AnalysisError> {
    write_distribution(distribution, create_file(path)?)?;
    info!(
        lines = distribution.line_count(),
        "distribution written to {}",
        path.display()
    );
    Ok(())
}
