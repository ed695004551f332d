//! Rate-limited PID controller.
//!
//! | Gain | Units             | Related setting        |
//! |------|-------------------|------------------------|
//! | `p`  | output / error    |                        |
//! | `i`  | output / (err·s)  | integral (windup) limits |
//! | `d`  | output · s / err  | slope window length    |
//!
//! Sign convention: `error = setpoint - measurement`, so a cold boiler
//! produces a positive error and a positive heater command.
//!
//! Each call to [`PidController::update`] walks **idle → due → updated**:
//! calls arriving sooner than the minimum interval after the last accepted
//! update return the previous output without touching the sensor.

use core::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::clamp::Clamp;
use super::integral::DiscreteIntegral;
use super::slope::SlopeEstimator;
use crate::app::ports::TemperatureSensor;
use crate::error::SensorError;
use crate::sensors::{TemperatureReading, ThermocoupleFault};

/// Proportional, integral and derivative gains.  Swapped wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl PidGains {
    pub const fn new(p: f32, i: f32, d: f32) -> Self {
        Self { p, i, d }
    }

    pub fn is_finite(&self) -> bool {
        self.p.is_finite() && self.i.is_finite() && self.d.is_finite()
    }
}

/// Fixed limits applied to a controller for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidLimits {
    /// Updates closer together than this return the previous output.
    pub min_update_interval: Duration,
    /// Anti-windup bounds on the integral area (`None` = unbounded).
    pub integral: Option<Clamp>,
    /// Bounds on the controller output.
    pub output: Clamp,
    /// Number of samples in the derivative regression window.
    pub slope_window: usize,
}

pub struct PidController {
    gains: PidGains,
    limits: PidLimits,
    integral: DiscreteIntegral,
    slope: SlopeEstimator,
    /// Setpoint of the last accepted update; `None` forces a reseed.
    last_setpoint: Option<f32>,
    /// Time of the last accepted update; `None` disables rate limiting once.
    last_update: Option<Duration>,
    last_reading: TemperatureReading,
    last_error: f32,
    output: f32,
}

impl PidController {
    pub fn new(gains: PidGains, limits: PidLimits) -> Self {
        Self {
            gains,
            limits,
            integral: DiscreteIntegral::new().with_clamp(limits.integral),
            slope: SlopeEstimator::new(limits.slope_window),
            last_setpoint: None,
            last_update: None,
            last_reading: TemperatureReading::Unavailable(ThermocoupleFault::NoData),
            last_error: 0.0,
            output: limits.output.apply(0.0),
        }
    }

    /// Run one control step.
    ///
    /// 1. Rate limit: too soon after the last accepted update → previous output.
    /// 2. Read the sensor.  Transport failures propagate; a fault-coded
    ///    reading holds the previous output and leaves integral and slope
    ///    untouched.
    /// 3. A setpoint different from the last accepted one reseeds integral
    ///    and slope with the current error.
    /// 4. `Kp·e + Ki·∫e + Kd·ė + feed_forward`, clamped to the output range.
    pub fn update<S>(
        &mut self,
        sensor: &mut S,
        now: Duration,
        setpoint: f32,
        feed_forward: f32,
    ) -> Result<f32, SensorError>
    where
        S: TemperatureSensor + ?Sized,
    {
        if let Some(last) = self.last_update {
            if now.saturating_sub(last) < self.limits.min_update_interval {
                return Ok(self.output);
            }
        }

        let reading = sensor.read()?;
        self.last_reading = reading;
        let measured = match reading {
            TemperatureReading::Celsius(c) if c.is_finite() => c,
            TemperatureReading::Celsius(c) => {
                warn!("PID: non-finite reading {c}, holding output {:.1}", self.output);
                return Ok(self.output);
            }
            TemperatureReading::Unavailable(fault) => {
                warn!("PID: sensor unavailable ({fault}), holding output {:.1}", self.output);
                return Ok(self.output);
            }
        };

        let error = setpoint - measured;
        match self.last_setpoint {
            Some(sp) if sp == setpoint => {
                self.integral.add_point(now, error);
                self.slope.add_point(now, error);
            }
            previous => {
                if let Some(sp) = previous {
                    info!("PID: setpoint {sp:.2} -> {setpoint:.2}, reseeding integral and slope");
                }
                self.seed(now, error, setpoint);
            }
        }

        let raw = self.gains.p * error
            + self.gains.i * self.integral.area()
            + self.gains.d * self.slope.slope()
            + feed_forward;
        self.output = self.limits.output.apply(raw);
        self.last_error = error;
        self.last_update = Some(now);

        debug!(
            "PID: sp={setpoint:.2} pv={measured:.2} e={error:.2} sum={:.3} slope={:.3} ff={feed_forward:.1} u={:.1}",
            self.integral.area(),
            self.slope.slope(),
            self.output
        );
        Ok(self.output)
    }

    /// Clear integral and derivative state and reseed both with a single
    /// sample at the current error.
    ///
    /// The last-update timestamp is cleared so the following `update` is not
    /// rate limited.  If the sensor reports a fault, seeding is deferred to
    /// the next accepted reading.
    pub fn reset<S>(
        &mut self,
        sensor: &mut S,
        now: Duration,
        setpoint: f32,
    ) -> Result<(), SensorError>
    where
        S: TemperatureSensor + ?Sized,
    {
        self.clear();
        let reading = sensor.read()?;
        self.last_reading = reading;
        match reading {
            TemperatureReading::Celsius(c) if c.is_finite() => {
                let error = setpoint - c;
                self.seed(now, error, setpoint);
                self.last_error = error;
            }
            other => {
                warn!("PID: reset with reading {other}, seeding deferred");
            }
        }
        Ok(())
    }

    /// Drop all accumulated state without touching the sensor.
    pub fn clear(&mut self) {
        self.integral.clear();
        self.slope.reset();
        self.last_setpoint = None;
        self.last_update = None;
        self.last_error = 0.0;
    }

    /// Swap gains without disturbing accumulated state.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn limits(&self) -> &PidLimits {
        &self.limits
    }

    /// Last computed output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Accumulated integral area.
    pub fn error_sum(&self) -> f32 {
        self.integral.area()
    }

    /// Current error slope (error units per second).
    pub fn slope(&self) -> f32 {
        self.slope.slope()
    }

    /// Error of the last accepted update.
    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    /// Most recent sensor reading, including fault-coded ones.
    pub fn last_reading(&self) -> TemperatureReading {
        self.last_reading
    }

    fn seed(&mut self, now: Duration, error: f32, setpoint: f32) {
        self.integral.seed(now, error);
        self.slope.reset();
        self.slope.add_point(now, error);
        self.last_setpoint = Some(setpoint);
    }
}
