/// A cache line while the trace is being folded in.
///
/// Only byte usage and access events are tracked; there is no tag, set or
/// replacement state.
#[derive(Debug)]
pub struct CacheLine {
    id: u64,
    // one flag per byte, true once any access covered it
    usage: Vec<bool>,
    total_accesses: u64,
}

impl CacheLine {
    pub fn new(id: u64, line_size: u64) -> Self {
        CacheLine {
            id,
            usage: vec![false; line_size as usize],
            total_accesses: 0,
        }
    }

    /// Marks the byte at `offset` as used. Marking twice is a no-op.
    pub fn mark(&mut self, offset: usize) {
        self.usage[offset] = true;
    }

    pub fn record_access(&mut self) {
        self.total_accesses += 1;
    }

    pub fn finish(self) -> LineStats {
        let used_bytes = self.usage.iter().filter(|&&used| used).count() as u64;
        let unused_bytes = self.usage.len() as u64 - used_bytes;
        LineStats {
            id: self.id,
            used_bytes,
            unused_bytes,
            total_accesses: self.total_accesses,
            usage: self.usage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStats {
    pub id: u64,
    pub used_bytes: u64,
    pub unused_bytes: u64,
    pub total_accesses: u64,
    usage: Vec<bool>,
}

impl LineStats {
    pub fn is_used(&self, offset: usize) -> bool {
        self.usage[offset]
    }

    pub fn line_size(&self) -> u64 {
        self.usage.len() as u64
    }

    pub fn base_address(&self) -> u64 {
        self.id * self.line_size()
    }
}
