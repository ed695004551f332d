//! Outbound application events.
//!
//! The [`EspressoMachine`](super::service::EspressoMachine) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: write log records, publish
//! JSON lines to a pub/sub bridge, drive a status display.

use serde::Serialize;

use crate::boiler::Mode;
use crate::control::PidGains;
use crate::sensors::TemperatureReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum AppEvent {
    /// The coordinator has started (carries the initial mode).
    Started(Mode),

    /// The boiler changed mode.
    ModeChanged { from: Mode, to: Mode },

    /// One or more safety faults were raised (bitmask).
    FaultDetected(u8),

    /// All safety faults have been cleared.
    FaultCleared,

    /// A heating mode's setpoint was changed (value after clamping).
    SetpointChanged { mode: Mode, celsius: f32 },

    /// A heating mode's gains were replaced.
    GainsChanged { mode: Mode, gains: PidGains },

    /// Per-tick telemetry snapshot.
    Telemetry(TelemetryData),
}

/// Front-panel indicator lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndicatorLights {
    pub power: bool,
    /// Brew mode and within the ready band.
    pub brew_ready: bool,
    /// Steam mode and within the ready band.
    pub steam_ready: bool,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub tick: u64,
    pub mode: Mode,
    pub reading: TemperatureReading,
    pub setpoint_c: Option<f32>,
    pub command: u16,
    pub output: f32,
    pub error_sum: f32,
    pub error_slope: f32,
    pub at_setpoint: bool,
    pub pump_on: bool,
    /// Controller board temperature, when a thermometer is attached.
    pub cpu_temp_c: Option<f32>,
    pub fault_flags: u8,
    pub lights: IndicatorLights,
}
