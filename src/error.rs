//! Unified error types for the boiler controller.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! coordinator's tick loop handles failures uniformly.  All variants are
//! `Copy` so they can be passed through the safety path without allocation.
//!
//! Thermocouple faults (open circuit, shorts) are **not** errors: they are
//! carried as [`TemperatureReading::Unavailable`](crate::sensors::TemperatureReading)
//! and handled by the controller's hold-last-command policy.

use core::fmt;

use embedded_hal::spi::ErrorKind as SpiErrorKind;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The temperature sensor could not be communicated with.
    Sensor(SensorError),
    /// A heater command could not be written.
    Actuator(ActuatorError),
    /// Configuration rejected at construction time.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Fatal sensor failures.  Never retried inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The SPI transfer to the thermocouple converter failed.
    Transport(SpiErrorKind),
    /// The sensor did not answer the construction-time probe.
    ProbeFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(kind) => write!(f, "SPI transfer failed ({kind:?})"),
            Self::ProbeFailed => write!(f, "sensor probe failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// Commanded value is outside the actuator's range.
    OutOfRange(u16),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::OutOfRange(v) => write!(f, "command {v} out of range"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A configuration field failed validation.  The string names the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A `[min, max]` pair has `min > max`.
    InvertedRange(&'static str),
    /// A value lies outside its permitted range.
    OutOfRange(&'static str),
    /// A gain or limit is NaN or infinite.
    NotFinite(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedRange(field) => write!(f, "{field}: min is greater than max"),
            Self::OutOfRange(field) => write!(f, "{field}: out of range"),
            Self::NotFinite(field) => write!(f, "{field}: not a finite number"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults are accumulated in a bitfield by the safety supervisor.
/// Any active fault forces the boiler off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// Thermocouple reported a fault for too many consecutive ticks.
    SensorFault = 0b0000_0001,
    /// Boiler temperature above the hard safety limit.
    OverTemperature = 0b0000_0010,
}

impl SafetyFault {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorFault => write!(f, "thermocouple fault"),
            Self::OverTemperature => write!(f, "over temperature"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
