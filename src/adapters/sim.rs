//! Simulated boiler plant for the host binary.
//!
//! A lumped thermal model shared between a fake MAX31855 bus
//! ([`SimSpi`]), a fake PWM channel ([`SimPwm`]) and a manually advanced
//! clock ([`SimClock`]).  The real driver stack runs on top unchanged:
//! the sensor still decodes SPI frames and the heater still writes duty
//! cycles.
//!
//! Heat balance per step, in °C/s:
//!
//! ```text
//! dT/dt = max_heating_rate · duty − loss · (T − ambient) − pump_draw · pump
//! ```

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use embedded_hal::pwm::{self, SetDutyCycle};
use embedded_hal::spi::{self, Operation, SpiDevice};
use log::info;

use crate::app::ports::{Clock, SwitchPort};
use crate::sensors::ThermocoupleFault;
use crate::sensors::max31855::{encode_fault, encode_frame};

const PWM_RESOLUTION: u16 = 1000;

/// Lumped-mass boiler model.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    pub temp_c: f32,
    pub ambient_c: f32,
    /// Heating rate at 100 % duty.
    pub max_heating_rate: f32,
    /// Newton cooling coefficient, 1/s.
    pub heat_loss_coefficient: f32,
    /// Extra cooling while the pump draws cold water, °C/s.
    pub pump_draw_rate: f32,
    pub duty: f32,
    pub pump_on: bool,
    /// Forced thermocouple fault, if any.
    pub fault: Option<ThermocoupleFault>,
    steps: u32,
}

impl Default for ThermalModel {
    fn default() -> Self {
        Self {
            temp_c: 22.0,
            ambient_c: 22.0,
            max_heating_rate: 2.5,
            heat_loss_coefficient: 0.004,
            pump_draw_rate: 1.2,
            duty: 0.0,
            pump_on: false,
            fault: None,
            steps: 0,
        }
    }
}

impl ThermalModel {
    /// Integrate the model forward by `dt`.
    pub fn step(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();
        let heat_in = self.max_heating_rate * self.duty;
        let loss = self.heat_loss_coefficient * (self.temp_c - self.ambient_c);
        let draw = if self.pump_on { self.pump_draw_rate } else { 0.0 };
        self.temp_c += (heat_in - loss - draw) * secs;
        if self.temp_c < self.ambient_c {
            self.temp_c = self.ambient_c;
        }
        self.steps = self.steps.wrapping_add(1);
    }

    /// Temperature as the thermocouple reports it, with ±0.1 °C of
    /// repeatable ripple.
    pub fn measured_c(&self) -> f32 {
        let ripple = (self.steps % 5) as f32 * 0.05 - 0.1;
        self.temp_c + ripple
    }
}

pub type SharedPlant = Rc<RefCell<ThermalModel>>;

pub fn shared_plant(model: ThermalModel) -> SharedPlant {
    Rc::new(RefCell::new(model))
}

// ───────────────────────────────────────────────────────────────
// SPI: thermocouple converter
// ───────────────────────────────────────────────────────────────

/// Answers reads with MAX31855 frames built from the plant.
pub struct SimSpi {
    plant: SharedPlant,
}

impl SimSpi {
    pub fn new(plant: SharedPlant) -> Self {
        Self { plant }
    }
}

impl spi::ErrorType for SimSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), spi::ErrorKind> {
        let plant = self.plant.borrow();
        let frame = match plant.fault {
            Some(fault) => encode_fault(fault),
            None => encode_frame(plant.measured_c(), plant.ambient_c),
        };
        for op in operations {
            if let Operation::Read(buf) = op {
                for (dst, src) in buf.iter_mut().zip(frame.iter()) {
                    *dst = *src;
                }
            }
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// PWM: heater SSR
// ───────────────────────────────────────────────────────────────

/// Records the duty cycle as a heating fraction on the plant.
pub struct SimPwm {
    plant: SharedPlant,
}

impl SimPwm {
    pub fn new(plant: SharedPlant) -> Self {
        Self { plant }
    }
}

impl pwm::ErrorType for SimPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        PWM_RESOLUTION
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), pwm::ErrorKind> {
        if duty > PWM_RESOLUTION {
            return Err(pwm::ErrorKind::Other);
        }
        self.plant.borrow_mut().duty = f32::from(duty) / f32::from(PWM_RESOLUTION);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Clock advanced by the simulation loop instead of by real time.
#[derive(Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<Duration>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

// ───────────────────────────────────────────────────────────────
// Switches
// ───────────────────────────────────────────────────────────────

/// Front panel driven by a script.  The pump switch also drives the
/// plant's pump so drawing water cools the boiler.
pub struct ScriptedPanel {
    plant: SharedPlant,
    pub power: bool,
    pub steam: bool,
    pub pump: bool,
}

impl ScriptedPanel {
    pub fn new(plant: SharedPlant) -> Self {
        Self { plant, power: false, steam: false, pump: false }
    }

    pub fn set(&mut self, power: bool, steam: bool, pump: bool) {
        if (power, steam, pump) != (self.power, self.steam, self.pump) {
            info!("panel: power={power} steam={steam} pump={pump}");
        }
        self.power = power;
        self.steam = steam;
        self.pump = pump;
    }
}

impl SwitchPort for ScriptedPanel {
    fn power_on(&mut self) -> bool {
        self.power
    }

    fn steam_on(&mut self) -> bool {
        self.steam
    }

    fn pump_on(&mut self) -> bool {
        self.plant.borrow_mut().pump_on = self.pump;
        self.pump
    }
}
