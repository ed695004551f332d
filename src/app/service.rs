//! Machine coordinator: the hexagonal core.
//!
//! [`EspressoMachine`] owns the [`Boiler`] and the safety supervisor.  It
//! reads the front-panel switches each tick, turns them into a mode and a
//! feed-forward hint, and drives the boiler.  All I/O flows through port
//! traits, making the whole coordinator testable with mock adapters.
//!
//! ```text
//!  SwitchPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │     EspressoMachine     │
//!                 │  Mode · Safety · Boiler │──▶ HeaterPort
//!  Sensor ──────▶ └────────────────────────┘
//! ```

use log::{info, warn};

use crate::app::ports::{Clock, CpuThermometer, HeaterPort, NoCpuThermometer, TemperatureSensor};
use crate::boiler::{Boiler, Mode};
use crate::config::BoilerConfig;
use crate::error::Result;
use crate::safety::SafetySupervisor;

use super::commands::AppCommand;
use super::events::{AppEvent, IndicatorLights, TelemetryData};
use super::ports::{EventSink, SwitchPort};

/// Mode selected by the switches: power off wins, then steam, else brew.
pub fn mode_from_switches(power: bool, steam: bool) -> Mode {
    match (power, steam) {
        (false, _) => Mode::Off,
        (true, true) => Mode::Steam,
        (true, false) => Mode::Brew,
    }
}

// ───────────────────────────────────────────────────────────────
// EspressoMachine
// ───────────────────────────────────────────────────────────────

/// The coordinator orchestrates all machine-level logic.
pub struct EspressoMachine<S, H, C, T = NoCpuThermometer>
where
    S: TemperatureSensor,
    H: HeaterPort,
    C: Clock,
    T: CpuThermometer,
{
    boiler: Boiler<S, H, C>,
    safety: SafetySupervisor,
    cpu: T,
    cpu_temp_c: Option<f32>,
    pump_feed_forward: f32,
    pump_on: bool,
    /// Set by [`AppCommand::Shutdown`], released when power is switched off.
    halted: bool,
    tick_count: u64,
}

impl<S, H, C> EspressoMachine<S, H, C>
where
    S: TemperatureSensor,
    H: HeaterPort,
    C: Clock,
{
    pub fn new(boiler: Boiler<S, H, C>, config: &BoilerConfig) -> Self {
        Self {
            boiler,
            safety: SafetySupervisor::new(config),
            cpu: NoCpuThermometer,
            cpu_temp_c: None,
            pump_feed_forward: config.pump_feed_forward,
            pump_on: false,
            halted: false,
            tick_count: 0,
        }
    }
}

impl<S, H, C, T> EspressoMachine<S, H, C, T>
where
    S: TemperatureSensor,
    H: HeaterPort,
    C: Clock,
    T: CpuThermometer,
{
    /// Report `cpu` alongside the boiler in telemetry.
    pub fn with_cpu_thermometer<U: CpuThermometer>(self, cpu: U) -> EspressoMachine<S, H, C, U> {
        EspressoMachine {
            boiler: self.boiler,
            safety: self.safety,
            cpu,
            cpu_temp_c: None,
            pump_feed_forward: self.pump_feed_forward,
            pump_on: self.pump_on,
            halted: self.halted,
            tick_count: self.tick_count,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.boiler.mode()));
        info!("EspressoMachine started in {}", self.boiler.mode());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: switches → mode → boiler → safety → telemetry.
    ///
    /// The CPU thermometer is sampled once per tick, just before telemetry.
    ///
    /// A sensor or heater failure has already forced the heater off by the
    /// time it is returned here.
    pub fn tick(&mut self, switches: &mut impl SwitchPort, sink: &mut impl EventSink) -> Result<()> {
        self.tick_count += 1;

        // 1. Read switches
        let power = switches.power_on();
        let steam = switches.steam_on();
        self.pump_on = switches.pump_on();
        if self.halted && !power {
            info!("power switched off, shutdown latch released");
            self.halted = false;
        }

        // 2. Resolve mode, with faults and the shutdown latch overriding the panel
        let target = if self.halted || self.safety.has_faults() {
            Mode::Off
        } else {
            mode_from_switches(power, steam)
        };
        self.change_mode(target, sink)?;

        // 3. Boiler update
        let feed_forward = if self.pump_on && target.is_heating() {
            self.pump_feed_forward
        } else {
            0.0
        };
        let before = self.boiler.mode();
        let updated = self.boiler.update(feed_forward);
        self.emit_mode_change(before, sink);
        updated?;

        // 4. Safety evaluation
        let previous = self.safety.faults();
        let faults = self.safety.evaluate(self.boiler.reading());
        if faults & !previous != 0 {
            warn!("Safety fault! flags=0b{:08b}", faults);
            self.change_mode(Mode::Off, sink)?;
            sink.emit(&AppEvent::FaultDetected(faults));
        } else if faults == 0 && previous != 0 {
            sink.emit(&AppEvent::FaultCleared);
        }

        // 5. Telemetry
        self.cpu_temp_c = self.cpu.cpu_temp_c();
        sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        Ok(())
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command between ticks.
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            AppCommand::SetSetpoint { mode, celsius } => {
                let applied = self.boiler.set_setpoint(mode, celsius)?;
                sink.emit(&AppEvent::SetpointChanged { mode, celsius: applied });
            }
            AppCommand::SetGains { mode, gains } => {
                self.boiler.set_gains(mode, gains)?;
                info!("{mode} gains set to p={} i={} d={}", gains.p, gains.i, gains.d);
                sink.emit(&AppEvent::GainsChanged { mode, gains });
            }
            AppCommand::Shutdown => {
                warn!("shutdown requested, heater latched off until power is cycled");
                self.halted = true;
                self.change_mode(Mode::Off, sink)?;
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            tick: self.tick_count,
            mode: self.boiler.mode(),
            reading: self.boiler.reading(),
            setpoint_c: self.boiler.setpoint(),
            command: self.boiler.current_command(),
            output: self.boiler.current_output(),
            error_sum: self.boiler.error_sum(),
            error_slope: self.boiler.error_slope(),
            at_setpoint: self.boiler.at_setpoint(),
            pump_on: self.pump_on,
            cpu_temp_c: self.cpu_temp_c,
            fault_flags: self.safety.faults(),
            lights: self.indicator_lights(),
        }
    }

    pub fn indicator_lights(&self) -> IndicatorLights {
        let mode = self.boiler.mode();
        let ready = self.boiler.at_setpoint();
        IndicatorLights {
            power: mode.is_heating(),
            brew_ready: mode == Mode::Brew && ready,
            steam_ready: mode == Mode::Steam && ready,
        }
    }

    pub fn boiler(&self) -> &Boiler<S, H, C> {
        &self.boiler
    }

    pub fn safety(&self) -> &SafetySupervisor {
        &self.safety
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn change_mode(&mut self, target: Mode, sink: &mut impl EventSink) -> Result<()> {
        let before = self.boiler.mode();
        if before == target {
            return Ok(());
        }
        let res = if target.is_heating() {
            self.boiler.set_mode(target)
        } else {
            self.boiler.shutdown()
        };
        self.emit_mode_change(before, sink);
        res
    }

    fn emit_mode_change(&self, before: Mode, sink: &mut impl EventSink) {
        let after = self.boiler.mode();
        if after != before {
            sink.emit(&AppEvent::ModeChanged { from: before, to: after });
        }
    }
}
