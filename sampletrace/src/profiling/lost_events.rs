use crate::export::LostCounters;

/// Counts delivered and dropped samples over one report run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LostEventAccumulator {
    sample_count: u64,
    lost_count: u64,
}

impl LostEventAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one reported sample
    pub fn record_sample(&mut self) {
        self.sample_count += 1;
    }

    /// Add the number of samples the recorder reported as dropped
    pub fn record_lost(&mut self, lost: u64) {
        self.lost_count = self.lost_count.saturating_add(lost);
    }

    #[must_use]
    pub fn counters(&self) -> LostCounters {
        LostCounters { sample_count: self.sample_count, lost_count: self.lost_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_samples_and_losses() {
        let mut lost = LostEventAccumulator::new();
        assert_eq!(lost.counters(), LostCounters { sample_count: 0, lost_count: 0 });

        lost.record_sample();
        lost.record_sample();
        lost.record_lost(5);
        lost.record_lost(0);
        lost.record_lost(3);
        assert_eq!(lost.counters(), LostCounters { sample_count: 2, lost_count: 8 });
    }
}
