//! On-delay timer state.

#![allow(missing_docs)]

use rustc_hash::FxHashMap;

use crate::program::ElementId;
use crate::value::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerOutput {
    pub q: bool,
    pub elapsed: Duration,
}

/// Non-retentive on-delay timer (TON).
///
/// The cycle on which power first arrives sets the baseline; every further
/// powered cycle adds its wall-clock delta. Losing power clears the
/// accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OnDelay {
    accumulated: Duration,
    running: bool,
}

impl OnDelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, input: bool, preset: Duration, delta: Duration) -> TimerOutput {
        if !input {
            self.running = false;
            self.accumulated = Duration::ZERO;
            return TimerOutput {
                q: false,
                elapsed: Duration::ZERO,
            };
        }
        if self.running {
            let delta = if delta.is_negative() {
                Duration::ZERO
            } else {
                delta
            };
            self.accumulated = self.accumulated.saturating_add(delta);
        } else {
            self.running = true;
            self.accumulated = Duration::ZERO;
        }
        TimerOutput {
            q: self.accumulated >= preset,
            elapsed: self.accumulated,
        }
    }

    #[must_use]
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Timer runtime state keyed by element position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerBank {
    timers: FxHashMap<ElementId, OnDelay>,
}

impl TimerBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&OnDelay> {
        self.timers.get(&id)
    }

    pub fn entry(&mut self, id: ElementId) -> &mut OnDelay {
        self.timers.entry(id).or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
