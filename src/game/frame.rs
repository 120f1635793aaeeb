//! Frame clock and timing observability
//!
//! One `FrameClock::advance` call per rendered frame produces the
//! `FrameContext` every stage of that frame reads. `FrameTimings` keeps a
//! rolling window of measured step durations so the per-frame budget can be
//! inspected; it never changes simulation behavior.

use std::collections::VecDeque;
use std::time::Duration;

use crate::game::constants::frame;

/// Per-frame timing inputs, fixed for the duration of one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Clamped delta time in seconds
    pub dt: f32,
    /// Monotonic simulation time in seconds
    pub now: f64,
    /// Frame counter, increments once per step
    pub tick: u64,
}

/// Produces one `FrameContext` per step from raw caller-supplied timing
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    now: f64,
    tick: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one frame.
    ///
    /// The delta is clamped to `[0, MAX_DELTA]` so a long stall cannot turn
    /// into one giant integration step. `now` never goes backwards: a
    /// regressed or duplicate wall timestamp advances by the clamped delta
    /// instead of rewinding.
    pub fn advance(&mut self, raw_dt: f32, timestamp: f64) -> FrameContext {
        let dt = if raw_dt.is_finite() {
            raw_dt.clamp(0.0, frame::MAX_DELTA)
        } else {
            0.0
        };

        if timestamp.is_finite() && timestamp > self.now {
            self.now = timestamp;
        } else {
            self.now += dt as f64;
        }
        self.tick += 1;

        FrameContext {
            dt,
            now: self.now,
            tick: self.tick,
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// Rolling window of measured frame durations
#[derive(Debug, Clone)]
pub struct FrameTimings {
    samples: VecDeque<Duration>,
    max_samples: usize,
    budget: Duration,
}

impl FrameTimings {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(frame::TIMING_WINDOW),
            max_samples: frame::TIMING_WINDOW,
            budget: Duration::from_secs_f32(frame::BUDGET_MS / 1000.0),
        }
    }

    /// Record one measured step duration
    pub fn record(&mut self, duration: Duration) {
        self.samples.push_back(duration);
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    /// 95th percentile of the current window
    pub fn p95(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.samples.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted
            .get(idx.min(sorted.len() - 1))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Average usage of the frame budget as a percentage (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        (self.average().as_secs_f32() / self.budget.as_secs_f32()) * 100.0
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for FrameTimings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_increments_tick() {
        let mut clock = FrameClock::new();
        let a = clock.advance(0.016, 1.0);
        let b = clock.advance(0.016, 1.016);
        assert_eq!(a.tick, 1);
        assert_eq!(b.tick, 2);
    }

    #[test]
    fn test_dt_clamped_to_max() {
        let mut clock = FrameClock::new();
        let ctx = clock.advance(5.0, 1.0);
        assert_eq!(ctx.dt, frame::MAX_DELTA);
    }

    #[test]
    fn test_negative_dt_clamped_to_zero() {
        let mut clock = FrameClock::new();
        let ctx = clock.advance(-0.5, 1.0);
        assert_eq!(ctx.dt, 0.0);
    }

    #[test]
    fn test_nan_dt_treated_as_zero() {
        let mut clock = FrameClock::new();
        let ctx = clock.advance(f32::NAN, 1.0);
        assert_eq!(ctx.dt, 0.0);
    }

    #[test]
    fn test_now_follows_timestamps() {
        let mut clock = FrameClock::new();
        let ctx = clock.advance(0.016, 100.0);
        assert_eq!(ctx.now, 100.0);
        let ctx = clock.advance(0.016, 100.016);
        assert_eq!(ctx.now, 100.016);
    }

    #[test]
    fn test_now_never_rewinds() {
        let mut clock = FrameClock::new();
        clock.advance(0.016, 100.0);
        // Regressed wall clock: advance by dt instead
        let ctx = clock.advance(0.016, 50.0);
        assert!(ctx.now > 100.0);
        assert!((ctx.now - 100.016).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_timestamp_still_advances() {
        let mut clock = FrameClock::new();
        clock.advance(0.016, 100.0);
        let ctx = clock.advance(0.016, 100.0);
        assert!(ctx.now > 100.0);
    }

    #[test]
    fn test_timings_average() {
        let mut timings = FrameTimings::new();
        for _ in 0..10 {
            timings.record(Duration::from_millis(4));
        }
        assert_eq!(timings.average(), Duration::from_millis(4));
        assert!(timings.budget_usage_percent() < 50.0);
    }

    #[test]
    fn test_timings_p95_tracks_outliers() {
        let mut timings = FrameTimings::new();
        for _ in 0..95 {
            timings.record(Duration::from_millis(2));
        }
        for _ in 0..5 {
            timings.record(Duration::from_millis(20));
        }
        assert!(timings.p95() >= Duration::from_millis(2));
        assert!(timings.average() < Duration::from_millis(20));
    }

    #[test]
    fn test_timings_window_bounded() {
        let mut timings = FrameTimings::new();
        for _ in 0..(frame::TIMING_WINDOW * 2) {
            timings.record(Duration::from_millis(1));
        }
        assert_eq!(timings.sample_count(), frame::TIMING_WINDOW);
    }

    #[test]
    fn test_timings_empty() {
        let timings = FrameTimings::new();
        assert_eq!(timings.average(), Duration::ZERO);
        assert_eq!(timings.p95(), Duration::ZERO);
    }
}
