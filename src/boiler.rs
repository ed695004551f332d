//! Boiler: one heater, one thermocouple, one PID loop, three modes.
//!
//! | From         | To          | Action                                           |
//! |--------------|-------------|--------------------------------------------------|
//! | Off          | Brew/Steam  | load the mode's gains, reset the PID, run once   |
//! | Brew ↔ Steam | –           | swap gains; the setpoint change reseeds the PID  |
//! | any          | Off         | heater to 0 immediately, controller untouched    |
//!
//! ## Safety contract
//!
//! The heater is off whenever the mode is [`Mode::Off`], after every fault
//! path ([`Boiler::shutdown`], a sensor transport error, a failed heater
//! write) and when the boiler is dropped.  Writes are deduplicated while
//! heating; in `Off` the zero command is written on every update.

use core::fmt;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, HeaterPort, TemperatureSensor};
use crate::config::{BoilerConfig, ModeProfile};
use crate::control::{Clamp, PidController, PidGains};
use crate::error::{ConfigError, Error, Result};
use crate::sensors::TemperatureReading;

/// Operating mode of the machine.  Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Off,
    Brew,
    Steam,
}

impl Mode {
    pub fn is_heating(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Brew => write!(f, "brew"),
            Self::Steam => write!(f, "steam"),
        }
    }
}

pub struct Boiler<S, H, C>
where
    S: TemperatureSensor,
    H: HeaterPort,
    C: Clock,
{
    sensor: S,
    heater: H,
    clock: C,
    pid: PidController,
    mode: Mode,
    brew: ModeProfile,
    steam: ModeProfile,
    setpoint_range: Clamp,
    at_setpoint_tolerance: f32,
    /// Largest command ever sent: min(heater full scale, output limit).
    max_command: u16,
    /// Last command written to the heater.
    command: u16,
    reading: TemperatureReading,
}

impl<S, H, C> Boiler<S, H, C>
where
    S: TemperatureSensor,
    H: HeaterPort,
    C: Clock,
{
    /// Validate `config`, drive the heater off and take a first reading.
    ///
    /// Starts in [`Mode::Off`].  A sensor that cannot be read fails
    /// construction.
    pub fn new(mut sensor: S, mut heater: H, clock: C, config: &BoilerConfig) -> Result<Self> {
        config.validate()?;
        heater.set_command(0)?;
        let reading = sensor.read()?;

        let limit = config.output_limits.max().floor();
        let max_command = if limit < f32::from(heater.max_command()) {
            limit as u16
        } else {
            heater.max_command()
        };

        info!(
            "boiler: ready, {reading}, brew {:.1} °C, steam {:.1} °C, max command {max_command}",
            config.brew.setpoint_c, config.steam.setpoint_c
        );

        Ok(Self {
            sensor,
            heater,
            clock,
            pid: PidController::new(config.brew.gains, config.pid_limits()),
            mode: Mode::Off,
            brew: config.brew,
            steam: config.steam,
            setpoint_range: config.setpoint_range,
            at_setpoint_tolerance: config.at_setpoint_tolerance,
            max_command,
            command: 0,
            reading,
        })
    }

    // ── Mode changes ──────────────────────────────────────────

    /// Switch modes following the transition table above.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        let from = self.mode;
        info!("boiler: {from} -> {mode}");

        let Some(profile) = self.profile(mode).copied() else {
            self.mode = Mode::Off;
            self.force_off()?;
            return Ok(());
        };

        self.pid.set_gains(profile.gains);
        self.mode = mode;
        if from == Mode::Off {
            let setpoint = self.setpoint_range.apply(profile.setpoint_c);
            let now = self.clock.now();
            if let Err(e) = self.pid.reset(&mut self.sensor, now, setpoint) {
                self.mode = Mode::Off;
                self.fail_safe();
                return Err(e.into());
            }
            self.reading = self.pid.last_reading();
            self.update(0.0)?;
        }
        Ok(())
    }

    /// Force the heater off and drop to [`Mode::Off`].
    pub fn shutdown(&mut self) -> Result<()> {
        if self.mode.is_heating() {
            warn!("boiler: shutdown from {}", self.mode);
        }
        self.mode = Mode::Off;
        self.force_off()
    }

    // ── Per-tick ──────────────────────────────────────────────

    /// Run one control tick and return the heater command now in effect.
    ///
    /// `feed_forward` is added to the controller output before clamping.
    pub fn update(&mut self, feed_forward: f32) -> Result<u16> {
        if !self.mode.is_heating() {
            let read = self.sensor.read();
            self.force_off()?;
            self.reading = read?;
            return Ok(0);
        }

        let setpoint = self.active_setpoint();
        let now = self.clock.now();
        let output = match self.pid.update(&mut self.sensor, now, setpoint, feed_forward) {
            Ok(u) => u,
            Err(e) => {
                error!("boiler: sensor failed ({e}), heater off");
                self.mode = Mode::Off;
                self.fail_safe();
                return Err(e.into());
            }
        };
        self.reading = self.pid.last_reading();

        let command = self.to_command(output);
        if command != self.command {
            if let Err(e) = self.heater.set_command(command) {
                error!("boiler: heater write of {command} failed ({e}), heater off");
                self.mode = Mode::Off;
                self.fail_safe();
                return Err(e.into());
            }
            self.command = command;
        }
        Ok(command)
    }

    // ── Settings ──────────────────────────────────────────────

    /// Change a heating mode's setpoint.  Returns the clamped value.
    ///
    /// Takes effect on the next update; the controller reseeds itself
    /// when it sees the new setpoint.
    pub fn set_setpoint(&mut self, mode: Mode, celsius: f32) -> core::result::Result<f32, ConfigError> {
        if !celsius.is_finite() {
            return Err(ConfigError::NotFinite("setpoint"));
        }
        let clamped = self.setpoint_range.apply(celsius);
        let profile = self.profile_mut(mode).ok_or(ConfigError::OutOfRange("mode"))?;
        profile.setpoint_c = clamped;
        if clamped != celsius {
            warn!("boiler: {mode} setpoint {celsius:.1} clamped to {clamped:.1}");
        } else {
            info!("boiler: {mode} setpoint {clamped:.1}");
        }
        Ok(clamped)
    }

    /// Replace a heating mode's gains.  Applied immediately if that mode
    /// is active, without resetting accumulated state.
    pub fn set_gains(&mut self, mode: Mode, gains: PidGains) -> core::result::Result<(), ConfigError> {
        if !gains.is_finite() {
            return Err(ConfigError::NotFinite("gains"));
        }
        let profile = self.profile_mut(mode).ok_or(ConfigError::OutOfRange("mode"))?;
        profile.gains = gains;
        if mode == self.mode {
            self.pid.set_gains(gains);
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Last reading taken, including fault-coded ones.
    pub fn reading(&self) -> TemperatureReading {
        self.reading
    }

    pub fn current_temp(&self) -> Option<f32> {
        self.reading.celsius()
    }

    /// Setpoint of the active mode, `None` when off.
    pub fn setpoint(&self) -> Option<f32> {
        self.mode.is_heating().then(|| self.active_setpoint())
    }

    /// Configured setpoint for a heating mode.
    pub fn mode_setpoint(&self, mode: Mode) -> Option<f32> {
        self.profile(mode).map(|p| p.setpoint_c)
    }

    pub fn mode_gains(&self, mode: Mode) -> Option<PidGains> {
        self.profile(mode).map(|p| p.gains)
    }

    /// Last command written to the heater.
    pub fn current_command(&self) -> u16 {
        self.command
    }

    /// Raw controller output, before conversion to a heater command.
    pub fn current_output(&self) -> f32 {
        self.pid.output()
    }

    pub fn error_sum(&self) -> f32 {
        self.pid.error_sum()
    }

    pub fn error_slope(&self) -> f32 {
        self.pid.slope()
    }

    /// True while heating and the reading is within the ready band.
    pub fn at_setpoint(&self) -> bool {
        match (self.setpoint(), self.current_temp()) {
            (Some(sp), Some(t)) => {
                let band = sp.abs() * self.at_setpoint_tolerance;
                t > sp - band && t < sp + band
            }
            _ => false,
        }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn heater(&self) -> &H {
        &self.heater
    }

    // ── Internal ──────────────────────────────────────────────

    fn profile(&self, mode: Mode) -> Option<&ModeProfile> {
        match mode {
            Mode::Off => None,
            Mode::Brew => Some(&self.brew),
            Mode::Steam => Some(&self.steam),
        }
    }

    fn profile_mut(&mut self, mode: Mode) -> Option<&mut ModeProfile> {
        match mode {
            Mode::Off => None,
            Mode::Brew => Some(&mut self.brew),
            Mode::Steam => Some(&mut self.steam),
        }
    }

    fn active_setpoint(&self) -> f32 {
        let raw = match self.mode {
            Mode::Steam => self.steam.setpoint_c,
            Mode::Brew | Mode::Off => self.brew.setpoint_c,
        };
        self.setpoint_range.apply(raw)
    }

    fn to_command(&self, output: f32) -> u16 {
        if !output.is_finite() {
            return 0;
        }
        output.round().clamp(0.0, f32::from(self.max_command)) as u16
    }

    /// Write 0 unconditionally.
    fn force_off(&mut self) -> Result<()> {
        let res = self.heater.set_command(0);
        if res.is_ok() {
            self.command = 0;
        }
        res.map_err(Error::from)
    }

    /// Best effort off on an error path that already has an error to report.
    fn fail_safe(&mut self) {
        if let Err(e) = self.force_off() {
            error!("boiler: could not force heater off: {e}");
        }
    }
}

impl<S, H, C> Drop for Boiler<S, H, C>
where
    S: TemperatureSensor,
    H: HeaterPort,
    C: Clock,
{
    fn drop(&mut self) {
        self.mode = Mode::Off;
        self.fail_safe();
    }
}
