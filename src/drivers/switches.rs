//! Front-panel switches on GPIO inputs.
//!
//! Three latching switches: power, steam and pump.  Each can be wired
//! active-high or active-low.  A pin that cannot be read counts as "off"
//! so a flaky input never turns the heater on.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::SwitchPort;

/// One input with its polarity.
pub struct PanelSwitch<P> {
    pin: P,
    active_low: bool,
    name: &'static str,
}

impl<P: InputPin> PanelSwitch<P> {
    pub fn active_high(pin: P, name: &'static str) -> Self {
        Self { pin, active_low: false, name }
    }

    pub fn active_low(pin: P, name: &'static str) -> Self {
        Self { pin, active_low: true, name }
    }

    pub fn is_on(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(_) => {
                warn!("switch {}: read failed, treating as off", self.name);
                false
            }
        }
    }
}

/// The machine's switch bank.
pub struct PanelSwitches<PW, ST, PU> {
    pub power: PanelSwitch<PW>,
    pub steam: PanelSwitch<ST>,
    pub pump: PanelSwitch<PU>,
}

impl<PW: InputPin, ST: InputPin, PU: InputPin> SwitchPort for PanelSwitches<PW, ST, PU> {
    fn power_on(&mut self) -> bool {
        self.power.is_on()
    }

    fn steam_on(&mut self) -> bool {
        self.steam.is_on()
    }

    fn pump_on(&mut self) -> bool {
        self.pump.is_on()
    }
}
