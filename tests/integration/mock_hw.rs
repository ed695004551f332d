//! Mock hardware adapters for integration tests.
//!
//! Every mock hands out a cloneable handle so a test can keep steering
//! the sensor, clock and switches after the boiler has taken ownership
//! of the adapter itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use latte_boiler::app::events::AppEvent;
use latte_boiler::app::ports::{Clock, EventSink, HeaterPort, SwitchPort, TemperatureSensor};
use latte_boiler::config::BoilerConfig;
use latte_boiler::error::{ActuatorError, SensorError};
use latte_boiler::sensors::{TemperatureReading, ThermocoupleFault};
use latte_boiler::{Boiler, Mode};

// ── Sensor ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum SensorState {
    Reading(TemperatureReading),
    BusError,
}

#[derive(Clone)]
pub struct MockSensor {
    state: Rc<Cell<SensorState>>,
    reads: Rc<Cell<u32>>,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(celsius: f32) -> Self {
        Self {
            state: Rc::new(Cell::new(SensorState::Reading(TemperatureReading::Celsius(celsius)))),
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn set(&self, celsius: f32) {
        self.state.set(SensorState::Reading(TemperatureReading::Celsius(celsius)));
    }

    pub fn fault(&self, fault: ThermocoupleFault) {
        self.state.set(SensorState::Reading(TemperatureReading::Unavailable(fault)));
    }

    pub fn break_bus(&self) {
        self.state.set(SensorState::BusError);
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl TemperatureSensor for MockSensor {
    fn read(&mut self) -> Result<TemperatureReading, SensorError> {
        self.reads.set(self.reads.get() + 1);
        match self.state.get() {
            SensorState::Reading(r) => Ok(r),
            SensorState::BusError => Err(SensorError::Transport(
                embedded_hal::spi::ErrorKind::ChipSelectFault,
            )),
        }
    }
}

// ── Heater ────────────────────────────────────────────────────

/// Records every command written.  Can be told to reject nonzero
/// commands, the way a PWM channel with a dead driver stage would.
#[derive(Clone, Default)]
pub struct MockHeater {
    writes: Rc<RefCell<Vec<u16>>>,
    reject_nonzero: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockHeater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<u16> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn last(&self) -> Option<u16> {
        self.writes.borrow().last().copied()
    }

    pub fn fail_nonzero_writes(&self, fail: bool) {
        self.reject_nonzero.set(fail);
    }
}

impl HeaterPort for MockHeater {
    fn set_command(&mut self, command: u16) -> Result<(), ActuatorError> {
        if command > self.max_command() {
            return Err(ActuatorError::OutOfRange(command));
        }
        if command != 0 && self.reject_nonzero.get() {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.writes.borrow_mut().push(command);
        Ok(())
    }

    fn max_command(&self) -> u16 {
        255
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockClock {
    now: Rc<Cell<Duration>>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Duration::from_secs(100))),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now.set(self.now.get() + Duration::from_millis(ms));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

// ── Switches ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockSwitches {
    pub power: bool,
    pub steam: bool,
    pub pump: bool,
}

impl SwitchPort for MockSwitches {
    fn power_on(&mut self) -> bool {
        self.power
    }

    fn steam_on(&mut self) -> bool {
        self.steam
    }

    fn pump_on(&mut self) -> bool {
        self.pump
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode changes in order, as `(from, to)`.
    pub fn mode_changes(&self) -> Vec<(Mode, Mode)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ModeChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type MockBoiler = Boiler<MockSensor, MockHeater, MockClock>;

/// A boiler built from mocks, plus the handles to steer them.
pub struct Rig {
    pub sensor: MockSensor,
    pub heater: MockHeater,
    pub clock: MockClock,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(celsius: f32) -> Self {
        Self {
            sensor: MockSensor::new(celsius),
            heater: MockHeater::new(),
            clock: MockClock::new(),
        }
    }

    pub fn boiler(&self, config: &BoilerConfig) -> MockBoiler {
        Boiler::new(self.sensor.clone(), self.heater.clone(), self.clock.clone(), config)
            .expect("boiler construction")
    }
}
