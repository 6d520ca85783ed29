//! Scan-cycle metrics.

#![allow(missing_docs)]

use crate::value::Duration;

/// Counters kept by a simulation across committed cycles.
///
/// `last` and `worst` measure engine evaluation only, not the scheduler's
/// sleep between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub last: Duration,
    pub worst: Duration,
    /// Periods in which the cycle finished after its deadline.
    pub overruns: u64,
}

impl CycleStats {
    pub fn record(&mut self, duration: std::time::Duration) {
        let duration = Duration::from(duration);
        self.cycles = self.cycles.saturating_add(1);
        self.last = duration;
        self.worst = self.worst.max(duration);
    }

    pub fn record_overrun(&mut self) {
        self.overruns = self.overruns.saturating_add(1);
    }
}
