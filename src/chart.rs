use std::fmt;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::distribution::RangeBucket;
use crate::error::AnalysisError;
use crate::output::ensure_parent_dir;

const CHART_SIZE: (u32, u32) = (1000, 600);

/// Where the chart for a distribution CSV goes: next to it, named after it.
pub fn chart_path(distribution_csv: &Path) -> PathBuf {
    let mut name = distribution_csv.with_extension("").into_os_string();
    name.push("_cacheline_distribution.svg");
    PathBuf::from(name)
}

fn chart_error(path: &Path, e: impl fmt::Display) -> AnalysisError {
    AnalysisError::Chart {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Renders the number of lines per range as a bar chart, one bar per range
/// in the given order.
pub fn render_distribution_chart(
    counts: &[(RangeBucket, usize)],
    path: &Path,
) -> Result<(), AnalysisError> {
    ensure_parent_dir(path)?;

    let labels: Vec<String> = counts.iter().map(|(bucket, _)| bucket.label()).collect();
    let y_max = counts.iter().map(|(_, count)| *count).max().unwrap_or(0) + 1;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_error(path, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Unused Cacheline Percentage Distribution",
            ("sans-serif", 28).into_font(),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d((0..counts.len()).into_segmented(), 0..y_max)
        .map_err(|e| chart_error(path, e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|x: &SegmentValue<usize>| match x {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                labels.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .x_desc("Unused Byte Percentage Ranges")
        .y_desc("Number of Cachelines")
        .draw()
        .map_err(|e| chart_error(path, e))?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(RED.filled())
                .margin(8)
                .data(counts.iter().enumerate().map(|(i, (_, count))| (i, *count))),
        )
        .map_err(|e| chart_error(path, e))?;

    root.present().map_err(|e| chart_error(path, e))?;
    info!("distribution chart saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_is_named_after_the_csv() {
        assert_eq!(
            chart_path(Path::new("out/dist.csv")),
            PathBuf::from("out/dist_cacheline_distribution.svg")
        );
        assert_eq!(
            chart_path(Path::new("dist")),
            PathBuf::from("dist_cacheline_distribution.svg")
        );
    }

    #[test]
    fn renders_an_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts/dist_cacheline_distribution.svg");
        let counts: Vec<(RangeBucket, usize)> = RangeBucket::all()
            .enumerate()
            .map(|(i, bucket)| (bucket, i % 3))
            .collect();

        render_distribution_chart(&counts, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }
}
