//! Cycle execution and commit.

#![allow(missing_docs)]

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::engine::run_cycle;
use crate::image::TagChange;
use crate::value::Duration;

use super::core::Simulation;

/// What one committed cycle changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub changes: Vec<TagChange>,
}

impl Simulation {
    /// Run one cycle at clock reading `now`.
    ///
    /// The elapsed time fed to timers is the distance to the previous cycle's
    /// reading; the first cycle after a reset or program load sees zero. A
    /// reading older than the previous one counts as no time passing.
    pub fn step_at(&mut self, now: Duration) -> CycleReport {
        let now = self.last_cycle_at.map_or(now, |last| last.max(now));
        let elapsed = match self.last_cycle_at {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.last_cycle_at = Some(now);
        self.step_with(elapsed)
    }

    /// Run one cycle with an explicit elapsed time and commit it.
    pub fn step_with(&mut self, elapsed: Duration) -> CycleReport {
        let started = Instant::now();
        let outcome = run_cycle(&self.image, &self.program, &self.timers, elapsed);
        let changes = self.image.diff(&outcome.image);

        self.image = outcome.image;
        self.timers = outcome.timers;
        self.trace = outcome.trace;
        self.cycle_counter = self.cycle_counter.saturating_add(1);
        self.stats.record(started.elapsed());

        debug!(
            cycle = self.cycle_counter,
            changes = changes.len(),
            "scan cycle committed"
        );
        CycleReport {
            cycle: self.cycle_counter,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{ProcessImage, TagChange};
    use crate::program::ElementId;
    use crate::runtime::Simulation;
    use crate::value::Duration;

    #[test]
    fn report_lists_committed_changes() {
        let mut sim = Simulation::new(ProcessImage::new());
        sim.load_json(r#"[[{"type":"NO","tag":"START"},{"type":"COIL","tag":"MOTOR"}]]"#)
            .unwrap();
        sim.inject("START", true);

        let report = sim.step_with(Duration::ZERO);
        assert_eq!(report.cycle, 1);
        assert_eq!(
            report.changes,
            vec![TagChange {
                tag: "MOTOR".into(),
                before: false,
                after: true,
            }]
        );

        let report = sim.step_with(Duration::ZERO);
        assert_eq!(report.cycle, 2);
        assert!(report.changes.is_empty());
    }

    #[test]
    fn elapsed_follows_clock_readings() {
        let mut sim = Simulation::default();
        sim.load_json(
            r#"[[{"type":"NO","tag":"IN"},{"type":"TON","tag":"T1","time":2},{"type":"COIL","tag":"OUT"}]]"#,
        )
        .unwrap();
        sim.inject("IN", true);

        sim.step_at(Duration::from_secs(10));
        assert!(!sim.image().read("OUT"));
        sim.step_at(Duration::from_millis(11_500));
        assert!(!sim.image().read("OUT"));
        sim.step_at(Duration::from_secs(12));
        assert!(sim.image().read("OUT"));
        assert_eq!(sim.stats().cycles, 3);
    }

    #[test]
    fn stale_clock_reading_adds_no_time() {
        let mut sim = Simulation::default();
        sim.load_json(
            r#"[[{"type":"NO","tag":"IN"},{"type":"TON","tag":"T1","time":1.5},{"type":"COIL","tag":"Q"}]]"#,
        )
        .unwrap();
        sim.inject("IN", true);

        sim.step_at(Duration::from_secs(10));
        sim.step_at(Duration::from_secs(9));
        sim.step_at(Duration::from_secs(11));

        let timer = sim.timers().get(ElementId::new(0, 1)).unwrap();
        assert_eq!(timer.accumulated(), Duration::from_secs(1));
        assert!(!sim.image().read("Q"));

        sim.step_at(Duration::from_millis(11_500));
        assert!(sim.image().read("Q"));
    }
}
