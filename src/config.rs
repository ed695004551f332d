//! Boiler configuration parameters.
//!
//! All tunable parameters for the espresso machine's boiler loop.  Defaults
//! are the values the machine shipped with; a settings channel may replace
//! them, but every replacement goes through [`BoilerConfig::validate`]
//! before it reaches a controller.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::slope::MAX_SLOPE_WINDOW;
use crate::control::{Clamp, PidGains, PidLimits};
use crate::error::ConfigError;

const DEFAULT_SETPOINT_RANGE: Clamp = Clamp::ordered(0.0, 160.0);
const DEFAULT_INTEGRAL_LIMITS: Clamp = Clamp::ordered(0.0, 100.0);
const DEFAULT_OUTPUT_LIMITS: Clamp = Clamp::ordered(0.0, 255.0);

/// Setpoint and gains for one heating mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    pub setpoint_c: f32,
    pub gains: PidGains,
}

/// Core boiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerConfig {
    // --- Profiles ---
    pub brew: ModeProfile,
    pub steam: ModeProfile,

    // --- Limits ---
    /// Setpoints are clamped into this range before use.
    pub setpoint_range: Clamp,
    /// Anti-windup bounds on the integral area (`None` = unbounded).
    pub integral_limits: Option<Clamp>,
    /// Controller output range, in heater command units.
    pub output_limits: Clamp,
    /// Minimum spacing of accepted controller updates (milliseconds).
    pub min_update_interval_ms: u32,
    /// Samples in the derivative regression window.
    pub slope_window: usize,

    // --- Feed-forward ---
    /// Bias added to the output while the pump runs.
    pub pump_feed_forward: f32,

    // --- Safety ---
    /// Hard over-temperature limit (Celsius).
    pub max_safe_temp_c: f32,
    /// Consecutive fault-coded readings before the sensor is declared failed.
    pub sensor_fault_ticks: u32,

    // --- Timing / display ---
    /// Coordinator tick interval (milliseconds).
    pub tick_interval_ms: u32,
    /// Relative band around the setpoint that counts as "ready".
    pub at_setpoint_tolerance: f32,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            brew: ModeProfile {
                setpoint_c: 95.0,
                gains: PidGains::new(100.0, 0.25, 250.0),
            },
            steam: ModeProfile {
                setpoint_c: 140.0,
                gains: PidGains::new(100.0, 0.0, 250.0),
            },

            setpoint_range: DEFAULT_SETPOINT_RANGE,
            integral_limits: Some(DEFAULT_INTEGRAL_LIMITS),
            output_limits: DEFAULT_OUTPUT_LIMITS,
            min_update_interval_ms: 200,
            slope_window: 10,

            pump_feed_forward: 128.0,

            max_safe_temp_c: 165.0,
            sensor_fault_ticks: 5,

            tick_interval_ms: 1000, // 1 Hz
            at_setpoint_tolerance: 0.05,
        }
    }
}

impl BoilerConfig {
    /// Reject configurations no controller should run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("setpoint_range", &self.setpoint_range)?;
        if let Some(limits) = &self.integral_limits {
            check_range("integral_limits", limits)?;
        }
        check_range("output_limits", &self.output_limits)?;
        if self.output_limits.min() < 0.0 {
            return Err(ConfigError::OutOfRange("output_limits"));
        }

        for (name, profile) in [("brew", &self.brew), ("steam", &self.steam)] {
            if !profile.setpoint_c.is_finite() || !profile.gains.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
            if !self.setpoint_range.contains(profile.setpoint_c) {
                return Err(ConfigError::OutOfRange(name));
            }
        }

        if !(2..=MAX_SLOPE_WINDOW).contains(&self.slope_window) {
            return Err(ConfigError::OutOfRange("slope_window"));
        }
        if !self.pump_feed_forward.is_finite() {
            return Err(ConfigError::NotFinite("pump_feed_forward"));
        }
        if !self.max_safe_temp_c.is_finite() {
            return Err(ConfigError::NotFinite("max_safe_temp_c"));
        }
        if self.max_safe_temp_c <= self.setpoint_range.max() {
            return Err(ConfigError::OutOfRange("max_safe_temp_c"));
        }
        if self.sensor_fault_ticks == 0 {
            return Err(ConfigError::OutOfRange("sensor_fault_ticks"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::OutOfRange("tick_interval_ms"));
        }
        if !(self.at_setpoint_tolerance > 0.0 && self.at_setpoint_tolerance < 1.0) {
            return Err(ConfigError::OutOfRange("at_setpoint_tolerance"));
        }
        Ok(())
    }

    /// Controller limits derived from this configuration.
    pub fn pid_limits(&self) -> PidLimits {
        PidLimits {
            min_update_interval: Duration::from_millis(u64::from(self.min_update_interval_ms)),
            integral: self.integral_limits,
            output: self.output_limits,
            slope_window: self.slope_window,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.tick_interval_ms))
    }
}

fn check_range(field: &'static str, clamp: &Clamp) -> Result<(), ConfigError> {
    if !clamp.min().is_finite() || !clamp.max().is_finite() {
        return Err(ConfigError::NotFinite(field));
    }
    if !clamp.is_valid() {
        return Err(ConfigError::InvertedRange(field));
    }
    Ok(())
}
