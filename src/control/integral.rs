//! Trapezoidal running integral of the control error.

use core::time::Duration;

use super::clamp::Clamp;

/// Running area under the error curve.
///
/// Each new point adds the trapezoid between it and the previous point,
/// assuming the error changed linearly in between.  When an anti-windup
/// clamp is set the area is clipped after **every** addition, so the
/// accumulator can never build a hidden reserve beyond its bounds.
#[derive(Debug, Clone)]
pub struct DiscreteIntegral {
    prev: Option<(Duration, f32)>,
    area: f32,
    clamp: Option<Clamp>,
}

impl Default for DiscreteIntegral {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscreteIntegral {
    pub fn new() -> Self {
        Self {
            prev: None,
            area: 0.0,
            clamp: None,
        }
    }

    pub fn with_clamp(mut self, clamp: Option<Clamp>) -> Self {
        self.set_clamp(clamp);
        self
    }

    /// Install (or remove) the anti-windup bounds and clip the current area.
    pub fn set_clamp(&mut self, clamp: Option<Clamp>) {
        self.clamp = clamp;
        self.clip();
    }

    /// Add a sample.  The first sample after construction or [`clear`]
    /// only records the starting point.
    ///
    /// [`clear`]: Self::clear
    pub fn add_point(&mut self, t: Duration, v: f32) {
        if let Some((t_prev, v_prev)) = self.prev {
            let dt = t.saturating_sub(t_prev).as_secs_f32();
            self.area += dt * (v + v_prev) / 2.0;
        }
        self.prev = Some((t, v));
        self.clip();
    }

    /// Zero the area and make `(t, v)` the starting point of the next
    /// trapezoid.
    pub fn seed(&mut self, t: Duration, v: f32) {
        self.area = 0.0;
        self.prev = Some((t, v));
        self.clip();
    }

    pub fn reset_area(&mut self) {
        self.area = 0.0;
        self.clip();
    }

    /// Zero the area and forget the previous point.
    pub fn clear(&mut self) {
        self.prev = None;
        self.reset_area();
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    fn clip(&mut self) {
        if let Some(c) = self.clamp {
            self.area = c.apply(self.area);
        }
    }
}
