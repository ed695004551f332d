//! Temperature readings and the thermocouple driver that produces them.
//!
//! A reading is either a Celsius value or a classified fault.  Faults are
//! not errors: the controller decides what to do with them (it holds its
//! last output).  Transport failures are errors and live in
//! [`SensorError`](crate::error::SensorError).

pub mod max31855;

use core::fmt;

use serde::Serialize;

/// Why a thermocouple could not produce a temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermocoupleFault {
    /// Thermocouple leads are disconnected.
    OpenCircuit,
    /// Thermocouple shorted to ground.
    ShortToGround,
    /// Thermocouple shorted to the supply rail.
    ShortToVcc,
    /// The converter clocked out an all-zero frame.
    NoData,
}

impl fmt::Display for ThermocoupleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "open thermocouple circuit"),
            Self::ShortToGround => write!(f, "thermocouple shorted to GND"),
            Self::ShortToVcc => write!(f, "thermocouple shorted to VCC"),
            Self::NoData => write!(f, "no data received"),
        }
    }
}

/// One sample from a temperature sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureReading {
    Celsius(f32),
    Unavailable(ThermocoupleFault),
}

impl TemperatureReading {
    /// The temperature, or `None` for a fault-coded reading.
    pub fn celsius(self) -> Option<f32> {
        match self {
            Self::Celsius(c) => Some(c),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Celsius(_))
    }

    pub fn fault(self) -> Option<ThermocoupleFault> {
        match self {
            Self::Celsius(_) => None,
            Self::Unavailable(f) => Some(f),
        }
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius(c) => write!(f, "{c:.2} °C"),
            Self::Unavailable(fault) => write!(f, "unavailable ({fault})"),
        }
    }
}
