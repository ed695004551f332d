//! Least-squares slope of the most recent error samples.
//!
//! Regressing over a short window suppresses the noise amplification of a
//! two-point finite difference, at the cost of a small lag.  The window is
//! sized by sample count rather than elapsed time, so under irregular
//! sampling it spans a variable time range.

use core::time::Duration;

use heapless::Deque;
use log::warn;

/// Largest window the estimator can hold.
pub const MAX_SLOPE_WINDOW: usize = 32;

/// Window used when none is configured.
pub const DEFAULT_SLOPE_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct SlopeEstimator {
    /// Newest sample at the front.
    samples: Deque<(Duration, f32), MAX_SLOPE_WINDOW>,
    capacity: usize,
    slope: f32,
}

impl Default for SlopeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SLOPE_WINDOW)
    }
}

impl SlopeEstimator {
    /// `capacity` is clamped into `2..=MAX_SLOPE_WINDOW`.
    pub fn new(capacity: usize) -> Self {
        let clamped = capacity.clamp(2, MAX_SLOPE_WINDOW);
        if clamped != capacity {
            warn!("slope: window {capacity} outside 2..={MAX_SLOPE_WINDOW}, using {clamped}");
        }
        Self {
            samples: Deque::new(),
            capacity: clamped,
            slope: 0.0,
        }
    }

    /// Insert a sample as the newest, evict the oldest beyond capacity and
    /// recompute the slope.
    pub fn add_point(&mut self, t: Duration, error: f32) -> f32 {
        while self.samples.len() >= self.capacity {
            self.samples.pop_back();
        }
        // Room is guaranteed by the eviction above.
        let _ = self.samples.push_front((t, error));
        self.slope = self.regress();
        self.slope
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.slope = 0.0;
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ordinary least squares over the window.
    ///
    /// Times are measured relative to the newest sample so that a long
    /// uptime does not eat into `f32` precision.
    fn regress(&self) -> f32 {
        let Some(&(newest, _)) = self.samples.front() else {
            return 0.0;
        };
        if self.samples.len() < 2 {
            return 0.0;
        }

        let n = self.samples.len() as f32;
        let offset = |t: Duration| -(newest.saturating_sub(t).as_secs_f32());

        let (sum_t, sum_e) = self
            .samples
            .iter()
            .fold((0.0_f32, 0.0_f32), |(st, se), &(t, e)| (st + offset(t), se + e));
        let mean_t = sum_t / n;
        let mean_e = sum_e / n;

        let (num, den, spread) = self.samples.iter().fold(
            (0.0_f32, 0.0_f32, 0.0_f32),
            |(num, den, spread), &(t, e)| {
                let o = offset(t);
                let dt = o - mean_t;
                (num + dt * (e - mean_e), den + dt * dt, spread + o * o)
            },
        );

        // Every sample shares one timestamp, up to rounding.  Relative to
        // the spread so sub-millisecond sampling still resolves.
        if den <= f32::EPSILON * spread {
            return 0.0;
        }
        num / den
    }
}
