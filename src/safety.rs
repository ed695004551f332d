//! Safety supervisor.
//!
//! Runs **every tick after the boiler update** and accumulates a fault
//! bitmask.  The coordinator forces the boiler to [`Mode::Off`] while any
//! bit is set.
//!
//! [`Mode::Off`]: crate::boiler::Mode::Off
//!
//! ## Fault lifecycle
//!
//! 1. A condition triggers a fault (e.g. the thermocouple stays open).
//! 2. The supervisor sets the corresponding bit.
//! 3. The coordinator shuts the boiler down.
//! 4. Each tick the supervisor re-evaluates the latest reading.  If the
//!    condition clears, it unsets the bit.
//! 5. When the mask is 0, the coordinator re-enters the switch-selected
//!    mode (which resets the controller on the way in).
//!
//! Multiple faults may be active at once; the boiler stays off until
//! *every* fault is resolved.

use log::{error, info};

use crate::config::BoilerConfig;
use crate::error::SafetyFault;
use crate::sensors::TemperatureReading;

/// Safety supervisor.
pub struct SafetySupervisor {
    max_temp_c: f32,
    /// Consecutive fault-coded readings tolerated before latching.
    fault_tick_limit: u32,
    /// Latched fault bitmask.
    faults: u8,
    /// Fault-coded readings seen in a row.
    unavailable_ticks: u32,
}

impl SafetySupervisor {
    pub fn new(config: &BoilerConfig) -> Self {
        Self {
            max_temp_c: config.max_safe_temp_c,
            fault_tick_limit: config.sensor_fault_ticks,
            faults: 0,
            unavailable_ticks: 0,
        }
    }

    /// Evaluate the latest boiler reading.  Returns the updated bitmask.
    pub fn evaluate(&mut self, reading: TemperatureReading) -> u8 {
        // ── Thermocouple ──────────────────────────────────────────
        match reading {
            TemperatureReading::Celsius(_) => self.unavailable_ticks = 0,
            TemperatureReading::Unavailable(_) => {
                self.unavailable_ticks = self.unavailable_ticks.saturating_add(1);
            }
        }
        self.eval_fault(
            SafetyFault::SensorFault,
            self.unavailable_ticks >= self.fault_tick_limit,
        );

        // ── Temperature ───────────────────────────────────────────
        // A faulted sensor says nothing about temperature; keep the last verdict.
        if let Some(c) = reading.celsius() {
            self.eval_fault(SafetyFault::OverTemperature, c > self.max_temp_c);
        }

        self.faults
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SAFETY FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
