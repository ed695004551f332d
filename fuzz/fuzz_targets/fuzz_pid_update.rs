//! Fuzz target: `PidController::update`
//!
//! Interprets the input as a stream of (time step, temperature) pairs,
//! including NaN and infinities, and asserts that neither the output nor
//! the integral ever leaves its clamp.
//!
//! cargo fuzz run fuzz_pid_update

#![no_main]

use std::time::Duration;

use latte_boiler::app::ports::TemperatureSensor;
use latte_boiler::control::{Clamp, PidController, PidGains, PidLimits};
use latte_boiler::error::SensorError;
use latte_boiler::sensors::TemperatureReading;
use libfuzzer_sys::fuzz_target;

struct Replay(f32);

impl TemperatureSensor for Replay {
    fn read(&mut self) -> Result<TemperatureReading, SensorError> {
        Ok(TemperatureReading::Celsius(self.0))
    }
}

fuzz_target!(|steps: Vec<(u16, f32)>| {
    let Some(output) = Clamp::new(0.0, 255.0) else { return };
    let limits = PidLimits {
        min_update_interval: Duration::from_millis(200),
        integral: Clamp::new(0.0, 100.0),
        output,
        slope_window: 10,
    };
    let mut pid = PidController::new(PidGains::new(100.0, 0.25, 250.0), limits);
    let mut t = Duration::ZERO;
    for (dt_ms, temp) in steps {
        t += Duration::from_millis(u64::from(dt_ms));
        // Finite values are limited to what the converter can report.
        let temp = if temp.is_finite() { temp.clamp(-2048.0, 2048.0) } else { temp };
        let mut sensor = Replay(temp);
        let Ok(out) = pid.update(&mut sensor, t, 95.0, 0.0) else { return };
        assert!((0.0..=255.0).contains(&out));
        assert!((0.0..=100.0).contains(&pid.error_sum()));
    }
});
