//! Port traits: the hexagonal boundary between the boiler core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Boiler / EspressoMachine (domain)
//! ```
//!
//! Driven adapters (thermocouple, heater, switches, clock, CPU
//! thermometer, event sinks) implement these traits.  The domain consumes
//! them via generics, so the control code never touches hardware directly
//! and every piece can be replaced by an in-memory fake in tests.

use core::time::Duration;

use crate::error::{ActuatorError, SensorError};
use crate::sensors::TemperatureReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Anything producing a boiler temperature.
///
/// A failed transfer is an `Err` and is fatal to the caller.  A sensor
/// that answered but reported a fault returns
/// `Ok(TemperatureReading::Unavailable(..))`.
pub trait TemperatureSensor {
    fn read(&mut self) -> Result<TemperatureReading, SensorError>;
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for &mut T {
    fn read(&mut self) -> Result<TemperatureReading, SensorError> {
        (**self).read()
    }
}

// ───────────────────────────────────────────────────────────────
// Heater port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the boiler heating element.
pub trait HeaterPort {
    /// Drive the heater at `command` in `0..=max_command()`.
    ///
    /// Idempotent.  Values above `max_command()` are rejected, not clamped.
    fn set_command(&mut self, command: u16) -> Result<(), ActuatorError>;

    /// Full-scale command value.
    fn max_command(&self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Switch port (driven adapter: front panel → domain)
// ───────────────────────────────────────────────────────────────

/// Debounced front-panel switch state.
pub trait SwitchPort {
    fn power_on(&mut self) -> bool;
    fn steam_on(&mut self) -> bool;
    fn pump_on(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Controller health port
// ───────────────────────────────────────────────────────────────

/// Temperature of the controller board itself, reported next to the
/// boiler reading.  Purely informational: `None` when unknown.
pub trait CpuThermometer {
    fn cpu_temp_c(&mut self) -> Option<f32>;
}

/// For machines without a CPU temperature source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCpuThermometer;

impl CpuThermometer for NoCpuThermometer {
    fn cpu_temp_c(&mut self) -> Option<f32> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time since an arbitrary origin.  Never goes backwards.
pub trait Clock {
    fn now(&self) -> Duration;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log records, a
/// JSON line stream for a pub/sub bridge, a display).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
