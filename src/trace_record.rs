use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AnalysisError;

const MIN_FIELDS: usize = 6;
const MEMORY_FLAG: &str = "1";

/// One load or store observed in the trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub instruction_address: u64,
    pub memory_address: u64,
    pub size: u32,
    pub executable_name: String,
    pub function_name: String,
    pub source_file: String,
    pub source_line: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("record must have at least 6 fields, found {0}")]
    TooFewFields(usize),

    #[error("not a memory operation")]
    NotMemoryAccess,

    #[error("invalid {field} {value:?}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
}

fn parse_hex_addr(field: &'static str, value: &str) -> Result<u64, ParseError> {
    let digits = value.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u64::from_str_radix(digits, 16).map_err(|source| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
        source,
    })
}

impl FromStr for AccessRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(',').collect();
        if parts.len() < MIN_FIELDS {
            return Err(ParseError::TooFewFields(parts.len()));
        }
        if parts[2] != MEMORY_FLAG {
            return Err(ParseError::NotMemoryAccess);
        }

        // attribution columns are optional and passed through untouched
        let text = |i: usize| parts.get(i).map(|s| s.to_string()).unwrap_or_default();

        Ok(AccessRecord {
            instruction_address: parse_hex_addr("instruction address", parts[0])?,
            memory_address: parse_hex_addr("memory address", parts[4])?,
            size: parts[5]
                .trim()
                .parse()
                .map_err(|source| ParseError::InvalidNumber {
                    field: "size",
                    value: parts[5].to_string(),
                    source,
                })?,
            executable_name: text(6),
            function_name: text(7),
            source_file: text(8),
            source_line: text(9),
        })
    }
}

/// Iterates over the memory accesses of a trace, in file order.
///
/// Lines that are not memory operations are dropped silently, malformed ones
/// with a warning. Bytes that are not valid UTF-8 are replaced rather than
/// failing the line. Only I/O failures are yielded as errors.
pub struct TraceParser<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    skipped: usize,
}

impl TraceParser<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        File::open(path)
            .map(|file| TraceParser::new(BufReader::new(file)))
            .map_err(|e| AnalysisError::read(path, e))
    }
}

impl<R: BufRead> TraceParser<R> {
    pub fn new(reader: R) -> Self {
        TraceParser {
            reader,
            buf: Vec::new(),
            line_no: 0,
            skipped: 0,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for TraceParser<R> {
    type Item = io::Result<AccessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.line_no += 1;
            let line = String::from_utf8_lossy(&self.buf);
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<AccessRecord>() {
                Ok(record) => return Some(Ok(record)),
                Err(ParseError::NotMemoryAccess) => {}
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_no, "skipping trace line {:?}: {}", line.trim(), e);
                }
            }
        }
    }
}

pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<AccessRecord>, AnalysisError> {
    let path = path.as_ref();
    let mut parser = TraceParser::open(path)?;
    let records = parser
        .by_ref()
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| AnalysisError::read(path, e))?;
    debug!(
        accepted = records.len(),
        skipped = parser.skipped(),
        "parsed trace {}",
        path.display()
    );
    Ok(records)
}
