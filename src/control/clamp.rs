//! Two-sided range limiter.

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` bounds.
///
/// Construction through [`Clamp::new`] guarantees `min <= max`.  A value
/// deserialized from config is checked by
/// [`BoilerConfig::validate`](crate::config::BoilerConfig::validate) before
/// any controller sees it, and [`apply`](Self::apply) never panics even on
/// inverted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clamp {
    min: f32,
    max: f32,
}

impl Clamp {
    /// Returns `None` if `min > max` or either bound is NaN.
    pub fn new(min: f32, max: f32) -> Option<Self> {
        if min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Bounds known at compile time.  Use in `const` items so an inverted
    /// pair fails the build.
    pub const fn ordered(min: f32, max: f32) -> Self {
        assert!(min <= max, "clamp bounds inverted");
        Self { min, max }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Limit `value` into the bounds.  NaN passes through unchanged.
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}
