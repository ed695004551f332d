//! Inbound commands to the coordinator.
//!
//! These represent actions requested by the outside world (a settings
//! channel, a console, tests) that the
//! [`EspressoMachine`](super::service::EspressoMachine) interprets and
//! acts upon between ticks.

use serde::Deserialize;

use crate::boiler::Mode;
use crate::control::PidGains;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AppCommand {
    /// Change a heating mode's setpoint.  Clamped to the safe range.
    SetSetpoint { mode: Mode, celsius: f32 },

    /// Replace a heating mode's gains.
    SetGains { mode: Mode, gains: PidGains },

    /// Turn the heater off and keep it off until the power switch is
    /// cycled.
    Shutdown,
}
