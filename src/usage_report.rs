//! The first-level report: one CSV row per byte of every touched cache line.
//!
//! Each row carries the byte's usage, its line's totals and a tail of
//! attribution groups, seven columns per instruction. The tail is padded so
//! every row in a file has the same width.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::output::{create_file, hex};
use crate::simulator::{AttributionEntry, CacheUsage};
use crate::summary::LineSummary;

const LEADING_COLUMNS: [&str; 7] = [
    "Memory Address",
    "Cache Line",
    "Usage",
    "Used Bytes",
    "Unused bytes",
    "Access Count",
    "Cacheline Total Count",
];
const ATTRIBUTION_FIELDS: usize = 7;
const UNUSED_PLACEHOLDER: &str = "N/A";

static HEX_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").expect("failed to compile regex"));
static DECIMAL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("failed to compile regex"));

fn header(slots: usize) -> Vec<String> {
    let mut header: Vec<String> = LEADING_COLUMNS.iter().map(|s| s.to_string()).collect();
    for i in 1..=slots {
        header.extend([
            format!("Instruction Address {i}"),
            format!("Bytes Transferred {i}"),
            format!("Inst_Addr_{i}_Count"),
            format!("Exe Name {i}"),
            format!("Func {i}"),
            format!("Source File {i}"),
            format!("Line No {i}"),
        ]);
    }
    header
}

fn attribution_fields(entry: &AttributionEntry) -> [String; ATTRIBUTION_FIELDS] {
    [
        hex(entry.instruction_address),
        entry.size.to_string(),
        entry.occurrence_count.to_string(),
        entry.executable_name.clone(),
        entry.function_name.clone(),
        entry.source_file.clone(),
        entry.source_line.clone(),
    ]
}

fn report_rows(usage: &CacheUsage, slots: usize) -> Vec<Vec<String>> {
    let width = LEADING_COLUMNS.len() + slots * ATTRIBUTION_FIELDS;
    let mut rows = Vec::new();

    for line in usage.lines() {
        for offset in 0..line.line_size() {
            let address = line.base_address() + offset;
            let used = line.is_used(offset as usize);
            let byte = usage.byte(address);

            let mut row = Vec::with_capacity(width);
            row.push(hex(address));
            row.push(hex(line.id));
            row.push(if used { "Used" } else { "Unused" }.to_string());
            row.push(line.used_bytes.to_string());
            row.push(line.unused_bytes.to_string());
            let access_count = if used { byte.map_or(0, |b| b.access_count) } else { 0 };
            row.push(access_count.to_string());
            // the line total only appears on the first row of its line
            row.push(if offset == 0 {
                line.total_accesses.to_string()
            } else {
                String::new()
            });

            if used {
                for entry in byte.into_iter().flat_map(|b| &b.attributions) {
                    row.extend(attribution_fields(entry));
                }
            } else {
                row.extend((0..ATTRIBUTION_FIELDS).map(|_| UNUSED_PLACEHOLDER.to_string()));
            }
            row.resize(width, String::new());
            rows.push(row);
        }
    }
    rows
}

/// Writes the first-level report for `usage`.
///
/// With no touched lines only the leading header columns are written.
pub fn write_usage_report<W: io::Write>(usage: &CacheUsage, writer: W) -> Result<(), AnalysisError> {
    let slots = if usage.lines().is_empty() {
        0
    } else {
        usage.max_attributions().max(1)
    };
    let rows = report_rows(usage, slots);

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    writer.write_record(header(slots))?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_usage_report_file(usage: &CacheUsage, path: &Path) -> Result<(), AnalysisError> {
    write_usage_report(usage, create_file(path)?)?;
    info!(
        lines = usage.lines().len(),
        "usage report written to {}",
        path.display()
    );
    Ok(())
}

#[derive(Debug, Error)]
enum RowError {
    #[error("unexpected row width {0}")]
    Shape(usize),

    #[error("invalid {column} {value:?}")]
    InvalidField { column: &'static str, value: String },
}

#[derive(Debug)]
struct ReportRow {
    cache_line: u64,
    used_bytes: u64,
    unused_bytes: u64,
    total_accesses: u64,
    attributions: Vec<AttributionEntry>,
}

fn parse_hex(value: &str) -> Option<u64> {
    if HEX_VALUE.is_match(value) {
        u64::from_str_radix(&value[2..], 16).ok()
    } else {
        None
    }
}

fn parse_decimal(value: &str) -> Option<u64> {
    if DECIMAL_VALUE.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

fn parse_attribution(fields: &[&str]) -> Option<AttributionEntry> {
    Some(AttributionEntry {
        instruction_address: parse_hex(fields[0])?,
        size: u32::try_from(parse_decimal(fields[1])?).ok()?,
        occurrence_count: parse_decimal(fields[2])?,
        executable_name: fields[3].to_string(),
        function_name: fields[4].to_string(),
        source_file: fields[5].to_string(),
        source_line: fields[6].to_string(),
    })
}

fn parse_row(record: &csv::StringRecord) -> Result<ReportRow, RowError> {
    let fields: Vec<&str> = record.iter().collect();
    let leading = LEADING_COLUMNS.len();
    if fields.len() < leading || (fields.len() - leading) % ATTRIBUTION_FIELDS != 0 {
        return Err(RowError::Shape(fields.len()));
    }

    let field = |i: usize, column: &'static str, parse: fn(&str) -> Option<u64>| {
        parse(fields[i]).ok_or_else(|| RowError::InvalidField {
            column,
            value: fields[i].to_string(),
        })
    };

    Ok(ReportRow {
        cache_line: field(1, "cache line", parse_hex)?,
        used_bytes: field(3, "used bytes", parse_decimal)?,
        unused_bytes: field(4, "unused bytes", parse_decimal)?,
        // blank on every row but the first of a line
        total_accesses: parse_decimal(fields[6]).unwrap_or(0),
        attributions: fields[leading..]
            .chunks_exact(ATTRIBUTION_FIELDS)
            .filter_map(parse_attribution)
            .collect(),
    })
}

/// Rolls a first-level report back up to one summary per cache line.
///
/// The first row of a line provides its byte totals and access count; every
/// row contributes attribution tuples. Rows that do not have the first-level
/// shape are skipped with a warning.
pub fn summarize_report<R: io::Read>(reader: R) -> Result<Vec<LineSummary>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let mut summaries: Vec<LineSummary> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = match parse_row(&record) {
            Ok(row) => row,
            Err(e) => {
                // data rows start on line 2
                warn!(line = i + 2, "skipping report row: {}", e);
                continue;
            }
        };

        let idx = *index.entry(row.cache_line).or_insert_with(|| {
            summaries.push(LineSummary::new(
                row.cache_line,
                row.used_bytes,
                row.unused_bytes,
                row.total_accesses,
            ));
            summaries.len() - 1
        });
        for entry in row.attributions {
            summaries[idx].add_attribution(entry);
        }
    }
    Ok(summaries)
}

pub fn read_report_summaries(path: &Path) -> Result<Vec<LineSummary>, AnalysisError> {
    let file = File::open(path).map_err(|e| AnalysisError::read(path, e))?;
    summarize_report(file)
}
