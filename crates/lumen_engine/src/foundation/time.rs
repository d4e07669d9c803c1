//! Time management utilities

use std::time::{Duration, Instant};

/// Fixed-interval tick scheduler.
///
/// Drives the context's update and render cadences. A clock becomes
/// due once its interval has elapsed since the previous due tick; the
/// reported delta is the real wall-clock time covered, not the nominal
/// interval, so slow hosts see proportionally larger deltas instead of
/// dropped simulation time. The first tick measures from construction.
#[derive(Debug)]
pub struct TickClock {
    interval: Duration,
    last_tick: Instant,
}

impl TickClock {
    /// Create a clock that first becomes due `interval` from now
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Create a clock with an explicit start instant (useful for tests)
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_tick: start,
        }
    }

    /// Poll the clock at `now`.
    ///
    /// Returns the elapsed seconds since the previous due tick when the
    /// interval has passed, `None` otherwise. Polling a due clock
    /// rearms it from `now`.
    pub fn poll(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.last_tick);
        if elapsed < self.interval {
            return None;
        }
        self.last_tick = now;
        Some(elapsed.as_secs_f32())
    }

    /// The configured tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_not_due_before_interval() {
        let start = Instant::now();
        let mut clock = TickClock::starting_at(Duration::from_millis(10), start);
        assert!(clock.poll(start + Duration::from_millis(5)).is_none());
    }

    #[test]
    fn test_clock_reports_real_elapsed_time() {
        let start = Instant::now();
        let mut clock = TickClock::starting_at(Duration::from_millis(10), start);

        // Overshooting the interval reports the full elapsed span.
        let dt = clock.poll(start + Duration::from_millis(25)).unwrap();
        assert!((dt - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_clock_rearms_after_due_tick() {
        let start = Instant::now();
        let mut clock = TickClock::starting_at(Duration::from_millis(10), start);

        assert!(clock.poll(start + Duration::from_millis(10)).is_some());
        assert!(clock.poll(start + Duration::from_millis(15)).is_none());
        assert!(clock.poll(start + Duration::from_millis(20)).is_some());
    }
}
