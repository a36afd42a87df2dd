use std::collections::HashMap;

use tracing::debug;

use crate::cache_line::{CacheLine, LineStats};
use crate::config::SimConfig;
use crate::trace_record::AccessRecord;

/// Per-byte state keyed by absolute byte address.
type AddrMap<T> = HashMap<u64, T>;

/// Which instruction touched a byte, and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionEntry {
    pub instruction_address: u64,
    pub size: u32,
    pub occurrence_count: u64,
    pub executable_name: String,
    pub function_name: String,
    pub source_file: String,
    pub source_line: String,
}

impl AttributionEntry {
    fn first_seen(record: &AccessRecord) -> Self {
        AttributionEntry {
            instruction_address: record.instruction_address,
            size: record.size,
            occurrence_count: 1,
            executable_name: record.executable_name.clone(),
            function_name: record.function_name.clone(),
            source_file: record.source_file.clone(),
            source_line: record.source_line.clone(),
        }
    }

    // Size is kept from the first sighting, the location fields follow the
    // latest one.
    fn seen_again(&mut self, record: &AccessRecord) {
        self.occurrence_count += 1;
        self.executable_name.clone_from(&record.executable_name);
        self.function_name.clone_from(&record.function_name);
        self.source_file.clone_from(&record.source_file);
        self.source_line.clone_from(&record.source_line);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteUsage {
    /// Number of accesses that started at this byte.
    pub access_count: u64,
    /// One entry per distinct instruction, in order of first touch.
    pub attributions: Vec<AttributionEntry>,
}

impl ByteUsage {
    fn attribute(&mut self, record: &AccessRecord) {
        match self
            .attributions
            .iter_mut()
            .find(|entry| entry.instruction_address == record.instruction_address)
        {
            Some(entry) => entry.seen_again(record),
            None => self.attributions.push(AttributionEntry::first_seen(record)),
        }
    }
}

/// Folds access records into per-line and per-byte usage.
#[derive(Debug)]
pub struct UsageSimulator {
    config: SimConfig,
    // insertion order is first-touch order
    lines: Vec<CacheLine>,
    line_index: HashMap<u64, usize>,
    bytes: AddrMap<ByteUsage>,
    accesses: usize,
}

impl UsageSimulator {
    pub fn new(config: SimConfig) -> Self {
        UsageSimulator {
            config,
            lines: Vec::new(),
            line_index: HashMap::new(),
            bytes: AddrMap::new(),
            accesses: 0,
        }
    }

    /// Applies one access. Bytes past the end of the line are dropped, an
    /// access never spills into the next line.
    pub fn access(&mut self, record: &AccessRecord) {
        let line_size = self.config.line_size();
        let (line_id, start) = self.config.locate(record.memory_address);
        let end = (start + u64::from(record.size)).min(line_size);

        let lines = &mut self.lines;
        let idx = *self.line_index.entry(line_id).or_insert_with(|| {
            lines.push(CacheLine::new(line_id, line_size));
            lines.len() - 1
        });
        let line = &mut self.lines[idx];
        let base = line_id * line_size;

        for offset in start..end {
            line.mark(offset as usize);
            let byte = self.bytes.entry(base + offset).or_default();
            if offset == start {
                byte.access_count += 1;
                line.record_access();
            }
            byte.attribute(record);
        }
        self.accesses += 1;
    }

    pub fn finish(self) -> CacheUsage {
        let lines: Vec<LineStats> = self.lines.into_iter().map(CacheLine::finish).collect();
        debug!(
            lines = lines.len(),
            bytes = self.bytes.len(),
            accesses = self.accesses,
            "simulation finished"
        );
        CacheUsage {
            lines,
            bytes: self.bytes,
            accesses: self.accesses,
        }
    }
}

/// Sorts the records by memory address (stable) and folds them in.
pub fn simulate(mut records: Vec<AccessRecord>, config: SimConfig) -> CacheUsage {
    records.sort_by_key(|record| record.memory_address);
    let mut simulator = UsageSimulator::new(config);
    for record in &records {
        simulator.access(record);
    }
    simulator.finish()
}

/// Finished usage of every touched cache line.
#[derive(Debug)]
pub struct CacheUsage {
    lines: Vec<LineStats>,
    bytes: AddrMap<ByteUsage>,
    accesses: usize,
}

impl CacheUsage {
    pub fn lines(&self) -> &[LineStats] {
        &self.lines
    }

    pub fn byte(&self, address: u64) -> Option<&ByteUsage> {
        self.bytes.get(&address)
    }

    pub fn accesses(&self) -> usize {
        self.accesses
    }

    /// Longest attribution list of any byte, zero when nothing was accessed.
    pub fn max_attributions(&self) -> usize {
        self.bytes
            .values()
            .map(|byte| byte.attributions.len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(inst: u64, addr: u64, size: u32) -> AccessRecord {
        AccessRecord {
            instruction_address: inst,
            memory_address: addr,
            size,
            executable_name: "app".into(),
            function_name: "f".into(),
            source_file: "f.c".into(),
            source_line: "1".into(),
        }
    }

    #[test]
    fn same_bytes_from_two_instructions() {
        let usage = simulate(
            vec![record(0x1, 0x0, 4), record(0x2, 0x0, 4)],
            SimConfig::default(),
        );
        let line = &usage.lines()[0];
        assert_eq!(line.used_bytes, 4);
        assert_eq!(line.unused_bytes, 60);
        assert_eq!(line.total_accesses, 2);

        let first = usage.byte(0).unwrap();
        assert_eq!(first.access_count, 2);
        assert_eq!(first.attributions.len(), 2);
        assert!(first.attributions.iter().all(|e| e.occurrence_count == 1));

        let third = usage.byte(2).unwrap();
        assert_eq!(third.access_count, 0);
        assert_eq!(third.attributions.len(), 2);
        assert_eq!(usage.max_attributions(), 2);
    }

    #[test]
    fn access_counts_only_on_the_first_byte() {
        let usage = simulate(
            vec![record(0x1, 0x10, 8), record(0x1, 0x12, 2)],
            SimConfig::default(),
        );
        let per_byte: u64 = (0x10..0x18)
            .map(|addr| usage.byte(addr).unwrap().access_count)
            .sum();
        assert_eq!(per_byte, 2);
        assert_eq!(usage.byte(0x12).unwrap().access_count, 1);
        assert_eq!(usage.byte(0x12).unwrap().attributions[0].occurrence_count, 2);
        assert_eq!(usage.byte(0x10).unwrap().attributions[0].occurrence_count, 1);
    }

    #[test]
    fn repeat_instruction_keeps_size_and_takes_latest_location() {
        let mut later = record(0x1, 0x0, 8);
        later.source_line = "99".into();
        later.function_name = "g".into();
        let usage = simulate(vec![record(0x1, 0x0, 4), later], SimConfig::default());

        let entry = &usage.byte(0).unwrap().attributions[0];
        assert_eq!(entry.occurrence_count, 2);
        assert_eq!(entry.size, 4);
        assert_eq!(entry.function_name, "g");
        assert_eq!(entry.source_line, "99");
    }

    #[test]
    fn access_is_clamped_to_its_line() {
        let usage = simulate(vec![record(0x1, 0x3c, 16)], SimConfig::default());
        assert_eq!(usage.lines().len(), 1);
        assert_eq!(usage.lines()[0].used_bytes, 4);
        assert!(usage.byte(0x40).is_none());
    }

    #[test]
    fn lines_follow_address_order_and_totals_match_accesses() {
        let records = vec![
            record(0x1, 0x100, 4),
            record(0x2, 0x40, 64),
            record(0x3, 0x0, 1),
            record(0x4, 0x104, 4),
        ];
        let usage = simulate(records, SimConfig::default());
        let ids: Vec<u64> = usage.lines().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 1, 4]);

        for line in usage.lines() {
            assert_eq!(line.used_bytes + line.unused_bytes, 64);
        }
        let total: u64 = usage.lines().iter().map(|l| l.total_accesses).sum();
        assert_eq!(total as usize, usage.accesses());
        assert_eq!(usage.lines()[1].unused_bytes, 0);
    }

    #[test]
    fn zero_sized_access_creates_an_untouched_line() {
        let usage = simulate(vec![record(0x1, 0x80, 0)], SimConfig::default());
        assert_eq!(usage.lines().len(), 1);
        assert_eq!(usage.lines()[0].used_bytes, 0);
        assert_eq!(usage.lines()[0].total_accesses, 0);
        assert_eq!(usage.max_attributions(), 0);
    }

    #[test]
    fn empty_input_has_no_lines() {
        let usage = simulate(Vec::new(), SimConfig::default());
        assert!(usage.lines().is_empty());
        assert_eq!(usage.max_attributions(), 0);
    }

    #[test]
    fn line_size_is_configurable() {
        let config = SimConfig::new(32).unwrap();
        let usage = simulate(vec![record(0x1, 0x20, 8)], config);
        let line = &usage.lines()[0];
        assert_eq!(line.id, 1);
        assert_eq!(line.used_bytes + line.unused_bytes, 32);
    }
}
