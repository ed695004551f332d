//! Boiler heating element on a PWM channel (solid-state relay input).
//!
//! Commands use an 8-bit scale, `0..=255`, mapped onto the channel's own
//! duty resolution.  The element is driven off when the driver is built
//! and again when it is dropped, so losing the driver never leaves the
//! boiler heating.
//!
//! ## Safety contract
//!
//! The heater must be off whenever the boiler is inactive.  Enforced by
//! [`Boiler`](crate::boiler::Boiler); this driver is a dumb actuator.

use embedded_hal::pwm::SetDutyCycle;
use log::{error, warn};

use crate::app::ports::HeaterPort;
use crate::error::ActuatorError;

/// Full-scale heater command.
pub const HEATER_FULL_SCALE: u16 = 255;

pub struct PwmHeater<P: SetDutyCycle> {
    pwm: P,
    command: u16,
}

impl<P: SetDutyCycle> PwmHeater<P> {
    /// Take the channel and force it to 0 % duty.
    pub fn new(pwm: P) -> Result<Self, ActuatorError> {
        let mut heater = Self { pwm, command: 0 };
        heater.write(0)?;
        Ok(heater)
    }

    /// Last command successfully written.
    pub fn command(&self) -> u16 {
        self.command
    }

    fn write(&mut self, command: u16) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fraction(command, HEATER_FULL_SCALE)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.command = command;
        Ok(())
    }
}

impl<P: SetDutyCycle> HeaterPort for PwmHeater<P> {
    fn set_command(&mut self, command: u16) -> Result<(), ActuatorError> {
        if command > HEATER_FULL_SCALE {
            warn!("heater: rejected command {command} > {HEATER_FULL_SCALE}");
            return Err(ActuatorError::OutOfRange(command));
        }
        self.write(command)
    }

    fn max_command(&self) -> u16 {
        HEATER_FULL_SCALE
    }
}

impl<P: SetDutyCycle> Drop for PwmHeater<P> {
    fn drop(&mut self) {
        if self.write(0).is_err() {
            error!("heater: failed to force off on drop");
        }
    }
}
