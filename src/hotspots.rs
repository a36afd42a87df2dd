use std::io;
use std::path::Path;

use tracing::info;

use crate::error::AnalysisError;
use crate::output::{create_file, hex};
use crate::summary::LineSummary;

const HEADER: [&str; 12] = [
    "Cache Line",
    "Used Bytes",
    "Unused Bytes",
    "Cacheline Total Count",
    "Product (Unused Bytes * Cacheline Total Count)",
    "Instruction Address",
    "Bytes Transferred",
    "Instruction Count",
    "Exe Name",
    "Func",
    "Source File",
    "Line No",
];

/// Orders lines by waste score, highest first. Equal scores keep their
/// incoming order.
///
/// A positive `top_n` keeps that many lines; zero or a negative value keeps all.
pub fn rank_hotspots(mut summaries: Vec<LineSummary>, top_n: i64) -> Vec<LineSummary> {
    summaries.sort_by(|a, b| b.waste_score().cmp(&a.waste_score()));
    if let Ok(n) = usize::try_from(top_n) {
        if n > 0 {
            summaries.truncate(n);
        }
    }
    summaries
}

pub fn write_hotspots<W: io::Write>(hotspots: &[LineSummary], writer: W) -> Result<(), AnalysisError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    writer.write_record(HEADER)?;

    for line in hotspots {
        let mut summary = vec![
            hex(line.cache_line),
            line.used_bytes.to_string(),
            line.unused_bytes.to_string(),
            line.total_accesses.to_string(),
            line.waste_score().to_string(),
        ];
        summary.resize(HEADER.len(), String::new());
        writer.write_record(&summary)?;

        for entry in &line.attributions {
            let mut row = vec![String::new(); 5];
            row.extend([
                hex(entry.instruction_address),
                entry.size.to_string(),
                entry.occurrence_count.to_string(),
                entry.executable_name.clone(),
                entry.function_name.clone(),
                entry.source_file.clone(),
                entry.source_line.clone(),
            ]);
            writer.write_record(&row)?;
        }
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_hotspots_file(hotspots: &[LineSummary], path: &Path) -> Result<(), AnalysisError> {
    write_hotspots(hotspots, create_file(path)?)?;
    info!(
        lines = hotspots.len(),
        "hotspot report written to {}",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::AttributionEntry;

    fn line(id: u64, unused: u64, total: u64) -> LineSummary {
        LineSummary::new(id, 64 - unused, unused, total)
    }

    fn ids(lines: &[LineSummary]) -> Vec<u64> {
        lines.iter().map(|l| l.cache_line).collect()
    }

    fn five_lines() -> Vec<LineSummary> {
        vec![
            line(1, 10, 1),
            line(2, 60, 4),
            line(3, 5, 2),
            line(4, 20, 13),
            line(5, 0, 100),
        ]
    }

    #[test]
    fn ranks_by_waste_score() {
        assert_eq!(ids(&rank_hotspots(five_lines(), -1)), vec![4, 2, 1, 3, 5]);
    }

    #[test]
    fn non_positive_top_n_keeps_everything() {
        assert_eq!(rank_hotspots(five_lines(), -1).len(), 5);
        assert_eq!(rank_hotspots(five_lines(), 0).len(), 5);
        assert_eq!(rank_hotspots(five_lines(), -7).len(), 5);
    }

    #[test]
    fn positive_top_n_truncates() {
        assert_eq!(ids(&rank_hotspots(five_lines(), 2)), vec![4, 2]);
        assert_eq!(rank_hotspots(five_lines(), 50).len(), 5);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let lines = vec![line(7, 4, 5), line(3, 10, 2), line(9, 20, 1), line(1, 2, 10)];
        assert_eq!(ids(&rank_hotspots(lines, -1)), vec![7, 3, 9, 1]);
    }

    #[test]
    fn writes_summary_then_attribution_rows() {
        let mut hot = line(0x2, 60, 3);
        hot.add_attribution(AttributionEntry {
            instruction_address: 0x401000,
            size: 4,
            occurrence_count: 3,
            executable_name: "app".into(),
            function_name: "main".into(),
            source_file: "main.c".into(),
            source_line: "10".into(),
        });

        let mut buf = Vec::new();
        write_hotspots(&[hot], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("Cache Line,Used Bytes,"));
        assert_eq!(rows[1], "0x2,4,60,3,180,,,,,,,");
        assert_eq!(rows[2], ",,,,,0x401000,4,3,app,main,main.c,10");
    }
}
