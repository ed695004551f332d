//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade.  The JSON sink implements the same trait for
//! machine consumers.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::TemperatureReading;

/// Adapter that logs every [`AppEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temp = match t.reading {
                    TemperatureReading::Celsius(c) => format!("{c:.2}\u{00b0}C"),
                    TemperatureReading::Unavailable(f) => format!("-- ({f})"),
                };
                info!(
                    "TELEM | #{} mode={} | T={} sp={} | cmd={} u={:.1} | \
                     sum={:.2} slope={:.3} | ready={} pump={} | cpu={} | faults=0b{:08b}",
                    t.tick,
                    t.mode,
                    temp,
                    t.setpoint_c.map_or_else(|| "-".into(), |s| format!("{s:.1}")),
                    t.command,
                    t.output,
                    t.error_sum,
                    t.error_slope,
                    t.at_setpoint,
                    t.pump_on,
                    t.cpu_temp_c.map_or_else(|| "-".into(), |c| format!("{c:.1}\u{00b0}C")),
                    t.fault_flags,
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {from} -> {to}");
            }
            AppEvent::FaultDetected(flags) => {
                warn!("FAULT | detected, flags=0b{:08b}", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::SetpointChanged { mode, celsius } => {
                info!("SET   | {mode} setpoint {celsius:.1}\u{00b0}C");
            }
            AppEvent::GainsChanged { mode, gains } => {
                info!("SET   | {mode} gains p={} i={} d={}", gains.p, gains.i, gains.d);
            }
            AppEvent::Started(mode) => {
                info!("START | initial_mode={mode}");
            }
        }
    }
}
