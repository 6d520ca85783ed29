//! Time quantities used by timers and the scheduler.

#![allow(missing_docs)]

use std::fmt;

/// Signed nanosecond duration.
///
/// Used for timer presets, elapsed-time deltas between scan cycles and
/// clock readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    nanos: i64,
}

impl Duration {
    pub const ZERO: Self = Self { nanos: 0 };

    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self {
            nanos: millis.saturating_mul(1_000_000),
        }
    }

    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self {
            nanos: secs.saturating_mul(1_000_000_000),
        }
    }

    /// Build from fractional seconds, rounding to the nearest nanosecond.
    ///
    /// Returns `None` for negative or non-finite input.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        let nanos = (secs * 1e9).round();
        if nanos > i64::MAX as f64 {
            return Some(Self { nanos: i64::MAX });
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(Self {
            nanos: nanos as i64,
        })
    }

    #[must_use]
    pub fn as_nanos(self) -> i64 {
        self.nanos
    }

    #[must_use]
    pub fn as_millis(self) -> i64 {
        self.nanos / 1_000_000
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }

    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            nanos: self.nanos.saturating_add(other.nanos),
        }
    }

    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            nanos: self.nanos.saturating_sub(other.nanos),
        }
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.nanos < 0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Self {
            nanos: i64::try_from(value.as_nanos()).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_seconds() {
        assert_eq!(Duration::from_secs_f64(0.1), Some(Duration::from_millis(100)));
        assert_eq!(Duration::from_secs_f64(3.0), Some(Duration::from_secs(3)));
        assert_eq!(Duration::from_secs_f64(-1.0), None);
        assert_eq!(Duration::from_secs_f64(f64::NAN), None);
    }

    #[test]
    fn display_matches_timer_symbol() {
        assert_eq!(Duration::from_millis(1540).to_string(), "1.5s");
        assert_eq!(Duration::ZERO.to_string(), "0.0s");
    }
}
