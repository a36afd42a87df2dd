use crate::error::AnalysisError;

/// Size of a cache line in bytes unless configured otherwise.
pub const DEFAULT_LINE_SIZE: u64 = 64;

/// Largest accepted line size: one 4 KiB page.
pub const MAX_LINE_SIZE: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    line_size: u64,
}

impl SimConfig {
    pub fn new(line_size: u64) -> Result<Self, AnalysisError> {
        if line_size == 0 || line_size > MAX_LINE_SIZE {
            return Err(AnalysisError::InvalidLineSize);
        }
        Ok(SimConfig { line_size })
    }

    pub fn line_size(&self) -> u64 {
        self.line_size
    }

    /// Splits an address into its cache line id and the byte offset inside it.
    pub fn locate(&self, address: u64) -> (u64, u64) {
        (address / self.line_size, address % self.line_size)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            line_size: DEFAULT_LINE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_line_size_is_rejected() {
        assert!(matches!(
            SimConfig::new(0),
            Err(AnalysisError::InvalidLineSize)
        ));
    }

    #[test]
    fn line_size_is_bounded_by_a_page() {
        assert_eq!(SimConfig::new(MAX_LINE_SIZE).unwrap().line_size(), 4096);
        assert!(matches!(
            SimConfig::new(MAX_LINE_SIZE + 1),
            Err(AnalysisError::InvalidLineSize)
        ));
        assert!(matches!(
            SimConfig::new(1 << 62),
            Err(AnalysisError::InvalidLineSize)
        ));
    }

    #[test]
    fn locate_splits_line_and_offset() {
        let config = SimConfig::default();
        assert_eq!(config.locate(0x0), (0, 0));
        assert_eq!(config.locate(0x41), (1, 1));
        assert_eq!(config.locate(0x7f), (1, 63));

        let wide = SimConfig::new(128).unwrap();
        assert_eq!(wide.locate(0x41), (0, 0x41));
    }
}
