//! Fixed-interval tick clock.
//!
//! Wall-clock frame deltas accumulate here; every full interval fires one
//! tick. Overflow past the interval boundary is subtracted, never reset, so
//! no time is lost across frames. Tick counts start at 1; count 0 means no
//! tick has fired yet.
//!
//! # Determinism
//!
//! The clock is pure arithmetic over the `Duration`s it is fed. Two clocks
//! fed the same delta sequence fire identical tick counts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound on ticks fired by a single [`IntervalClock::advance`] call.
/// A long stall (debugger, suspended laptop) otherwise turns into a burst
/// of thousands of ticks; surplus time stays accumulated and drains over
/// the following frames.
pub const MAX_TICKS_PER_ADVANCE: usize = 32;

/// Accumulating tick clock with pause support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalClock {
    interval: Duration,
    accumulated: Duration,
    count: u64,
    paused: bool,
}

impl IntervalClock {
    /// Create a clock firing every `interval`. A zero interval is clamped
    /// to one millisecond; config validation rejects it before it gets
    /// here.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_millis(1)
        } else {
            interval
        };
        Self {
            interval,
            accumulated: Duration::ZERO,
            count: 0,
            paused: false,
        }
    }

    /// The configured tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Count of the most recently fired tick; 0 before the first.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Whether the clock is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop accumulating. Partial progress toward the next tick is kept.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume accumulating from the preserved partial progress.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Feed a frame delta and collect the tick counts that fire.
    ///
    /// Usually returns zero or one count. Returns at most
    /// [`MAX_TICKS_PER_ADVANCE`] per call; a backlog beyond that carries
    /// over. While paused, time is discarded and nothing fires.
    pub fn advance(&mut self, dt: Duration) -> Vec<u64> {
        if self.paused {
            return Vec::new();
        }
        self.accumulated = self.accumulated.saturating_add(dt);
        let mut fired = Vec::new();
        while self.accumulated >= self.interval && fired.len() < MAX_TICKS_PER_ADVANCE {
            self.accumulated -= self.interval;
            self.count += 1;
            fired.push(self.count);
        }
        if self.accumulated >= self.interval {
            tracing::warn!(
                backlog_ms = self.accumulated.as_millis() as u64,
                "tick backlog capped, draining over following frames"
            );
        }
        fired
    }

    /// Fraction of the current interval elapsed, for progress UI.
    ///
    /// Presentation-only; simulation state never reads this value.
    /// Pinned just under 1.0 while a capped backlog drains.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let p = self.accumulated.as_secs_f32() / self.interval.as_secs_f32();
        if p >= 1.0 {
            0.999_999
        } else {
            p
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_first_tick_is_count_one() {
        let mut clock = IntervalClock::new(secs(1));
        assert_eq!(clock.count(), 0);
        assert_eq!(clock.advance(secs(1)), vec![1]);
        assert_eq!(clock.count(), 1);
    }

    #[test]
    fn test_no_tick_before_boundary() {
        let mut clock = IntervalClock::new(secs(1));
        assert!(clock.advance(millis(400)).is_empty());
        assert!(clock.advance(millis(400)).is_empty());
        // 400 + 400 + 400 = 1200ms: one tick, 200ms kept
        assert_eq!(clock.advance(millis(400)), vec![1]);
        assert!((clock.progress() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_overflow_is_subtracted_not_reset() {
        let mut clock = IntervalClock::new(secs(1));
        assert_eq!(clock.advance(millis(1500)), vec![1]);
        // 500ms surplus survived; 500ms more completes the next interval
        assert_eq!(clock.advance(millis(500)), vec![2]);
    }

    #[test]
    fn test_large_delta_fires_sequential_counts() {
        let mut clock = IntervalClock::new(secs(1));
        assert_eq!(clock.advance(millis(3200)), vec![1, 2, 3]);
        assert!((clock.progress() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_backlog_cap_carries_surplus() {
        let mut clock = IntervalClock::new(millis(10));
        let fired = clock.advance(secs(1));
        assert_eq!(fired.len(), MAX_TICKS_PER_ADVANCE);
        assert_eq!(*fired.last().unwrap(), MAX_TICKS_PER_ADVANCE as u64);
        // Backlog drains on later calls even with no new time
        let drained = clock.advance(Duration::ZERO);
        assert_eq!(drained.len(), MAX_TICKS_PER_ADVANCE);
        assert_eq!(*drained.first().unwrap(), MAX_TICKS_PER_ADVANCE as u64 + 1);
    }

    #[test]
    fn test_pause_discards_time_and_preserves_progress() {
        let mut clock = IntervalClock::new(secs(1));
        assert!(clock.advance(millis(600)).is_empty());
        clock.pause();
        assert!(clock.advance(secs(5)).is_empty());
        assert_eq!(clock.count(), 0);
        clock.resume();
        // The 600ms from before the pause still counts
        assert_eq!(clock.advance(millis(400)), vec![1]);
    }

    #[test]
    fn test_progress_stays_below_one() {
        let mut clock = IntervalClock::new(millis(10));
        let _ = clock.advance(secs(1));
        assert!(clock.progress() < 1.0);
        assert!(clock.progress() >= 0.0);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut clock = IntervalClock::new(Duration::ZERO);
        assert_eq!(clock.interval(), millis(1));
        assert_eq!(clock.advance(millis(1)), vec![1]);
    }
}
