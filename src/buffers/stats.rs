//! Buffer growth statistics

/// Counters describing how a payload buffer has been used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Number of reallocations performed
    pub grows: u64,
    /// Number of times the length was set by an operation
    pub fills: u64,
    /// Largest length ever stored
    pub peak_len: usize,
}

impl BufferStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reallocation
    pub fn record_grow(&mut self) {
        self.grows += 1;
    }

    /// Record a fill of `len` elements
    pub fn record_fill(&mut self, len: usize) {
        self.fills += 1;
        self.peak_len = self.peak_len.max(len);
    }

    /// Fraction of fills that needed a reallocation (0.0 to 1.0)
    pub fn grow_ratio(&self) -> f64 {
        if self.fills == 0 {
            return 0.0;
        }
        self.grows as f64 / self.fills as f64
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "BufferStats {{ grows: {}, fills: {}, peak_len: {} }}",
            self.grows, self.fills, self.peak_len
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_ratio() {
        let mut stats = BufferStats::new();
        assert_eq!(stats.grow_ratio(), 0.0);

        stats.record_fill(4);
        stats.record_grow();
        stats.record_fill(2);
        assert_eq!(stats.fills, 2);
        assert_eq!(stats.peak_len, 4);
        assert!((stats.grow_ratio() - 0.5).abs() < f64::EPSILON);
        assert!(stats.summary().contains("grows: 1"));
    }
}
