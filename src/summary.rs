use crate::simulator::{AttributionEntry, CacheUsage};

/// One cache line rolled back up from byte granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    pub cache_line: u64,
    pub used_bytes: u64,
    pub unused_bytes: u64,
    pub total_accesses: u64,
    /// Distinct attribution tuples seen on any byte of the line, in first-seen order.
    pub attributions: Vec<AttributionEntry>,
}

impl LineSummary {
    pub fn new(cache_line: u64, used_bytes: u64, unused_bytes: u64, total_accesses: u64) -> Self {
        LineSummary {
            cache_line,
            used_bytes,
            unused_bytes,
            total_accesses,
            attributions: Vec::new(),
        }
    }

    pub fn add_attribution(&mut self, entry: AttributionEntry) {
        if !self.attributions.contains(&entry) {
            self.attributions.push(entry);
        }
    }

    pub fn waste_score(&self) -> u64 {
        self.unused_bytes.saturating_mul(self.total_accesses)
    }
}

/// Summarizes simulator output directly, without a round trip through the
/// first-level report.
pub fn summarize(usage: &CacheUsage) -> Vec<LineSummary> {
    usage
        .lines()
        .iter()
        .map(|line| {
            let mut summary = LineSummary::new(
                line.id,
                line.used_bytes,
                line.unused_bytes,
                line.total_accesses,
            );
            for offset in 0..line.line_size() {
                if let Some(byte) = usage.byte(line.base_address() + offset) {
                    for entry in &byte.attributions {
                        summary.add_attribution(entry.clone());
                    }
                }
            }
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::simulator::simulate;
    use crate::trace_record::AccessRecord;

    #[test]
    fn identical_tuples_across_bytes_collapse() {
        let records: Vec<AccessRecord> = ["0x1,0,1,0,0x0,4,a,f,s,1", "0x2,0,1,0,0x2,1,a,g,s,2"]
            .iter()
            .map(|line| line.parse().unwrap())
            .collect();
        let summaries = summarize(&simulate(records, SimConfig::default()));

        assert_eq!(summaries.len(), 1);
        let line = &summaries[0];
        assert_eq!(line.used_bytes, 4);
        assert_eq!(line.total_accesses, 2);
        assert_eq!(line.waste_score(), 120);
        let instructions: Vec<u64> = line
            .attributions
            .iter()
            .map(|e| e.instruction_address)
            .collect();
        assert_eq!(instructions, vec![0x1, 0x2]);
    }

    #[test]
    fn waste_score_saturates() {
        assert_eq!(LineSummary::new(0, 0, u64::MAX, 2).waste_score(), u64::MAX);
        assert_eq!(LineSummary::new(0, 4, 60, 2).waste_score(), 120);
    }
}
