//! Integration tests for the EspressoMachine → Boiler → heater pipeline.
//!
//! These verify the switch-to-mode mapping, pump feed-forward, the safety
//! interlocks and the command channel, all against mock adapters.

use latte_boiler::app::commands::AppCommand;
use latte_boiler::app::events::AppEvent;
use latte_boiler::app::ports::CpuThermometer;
use latte_boiler::app::service::EspressoMachine;
use latte_boiler::config::BoilerConfig;
use latte_boiler::control::PidGains;
use latte_boiler::error::{ConfigError, Error, SafetyFault};
use latte_boiler::sensors::ThermocoupleFault;
use latte_boiler::Mode;

use super::mock_hw::{MockClock, MockHeater, MockSensor, MockSwitches, RecordingSink, Rig};

type Machine = EspressoMachine<MockSensor, MockHeater, MockClock>;

fn make_machine(celsius: f32) -> (Machine, Rig, MockSwitches, RecordingSink) {
    let config = BoilerConfig::default();
    let rig = Rig::new(celsius);
    let mut machine = EspressoMachine::new(rig.boiler(&config), &config);
    let mut sink = RecordingSink::new();
    machine.start(&mut sink);
    (machine, rig, MockSwitches::default(), sink)
}

fn tick(machine: &mut Machine, rig: &Rig, switches: &mut MockSwitches, sink: &mut RecordingSink) {
    rig.clock.advance_ms(1_000);
    machine.tick(switches, sink).unwrap();
}

#[test]
fn starts_off_and_stays_off_without_power() {
    let (mut m, rig, mut sw, mut sink) = make_machine(20.0);
    assert_eq!(sink.events.first(), Some(&AppEvent::Started(Mode::Off)));
    for _ in 0..3 {
        tick(&mut m, &rig, &mut sw, &mut sink);
    }
    assert_eq!(m.boiler().mode(), Mode::Off);
    assert!(rig.heater.writes().iter().all(|&c| c == 0));
    assert!(sink.mode_changes().is_empty());
}

#[test]
fn switches_select_mode() {
    let (mut m, rig, mut sw, mut sink) = make_machine(20.0);
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Brew);

    sw.steam = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Steam);

    sw.power = false;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));

    assert_eq!(
        sink.mode_changes(),
        vec![(Mode::Off, Mode::Brew), (Mode::Brew, Mode::Steam), (Mode::Steam, Mode::Off)]
    );
}

#[test]
fn pump_adds_feed_forward() {
    let (mut m, rig, mut sw, mut sink) = make_machine(95.0);
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().current_command(), 0);

    sw.pump = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().current_command(), 128);
    assert!(m.build_telemetry().pump_on);

    sw.pump = false;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().current_command(), 0);
}

#[test]
fn open_thermocouple_latches_off_then_recovers() {
    let (mut m, rig, mut sw, mut sink) = make_machine(90.0);
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert!(rig.heater.last().unwrap_or(0) > 0);

    rig.sensor.fault(ThermocoupleFault::OpenCircuit);
    for _ in 0..5 {
        tick(&mut m, &rig, &mut sw, &mut sink);
    }
    assert!(m.safety().has_fault(SafetyFault::SensorFault));
    assert_eq!(m.boiler().mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultDetected(_))), 1);

    // Still faulted: stays off while the panel asks for brew.
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Off);

    rig.sensor.set(90.0);
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert!(!m.safety().has_faults());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);

    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Brew);
}

#[test]
fn over_temperature_forces_off() {
    let (mut m, rig, mut sw, mut sink) = make_machine(120.0);
    sw.power = true;
    sw.steam = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Steam);

    rig.sensor.set(170.0);
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert!(m.safety().has_fault(SafetyFault::OverTemperature));
    assert_eq!(m.boiler().mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));

    let t = m.build_telemetry();
    assert_eq!(t.fault_flags, SafetyFault::OverTemperature.mask());
    assert!(!t.lights.power);
}

#[test]
fn shutdown_latches_until_power_cycled() {
    let (mut m, rig, mut sw, mut sink) = make_machine(90.0);
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Brew);

    m.handle_command(AppCommand::Shutdown, &mut sink).unwrap();
    assert!(m.is_halted());
    assert_eq!(rig.heater.last(), Some(0));
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Off);

    sw.power = false;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert!(!m.is_halted());
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Brew);
}

#[test]
fn setpoint_command_is_clamped_and_announced() {
    let (mut m, _rig, _sw, mut sink) = make_machine(90.0);
    m.handle_command(AppCommand::SetSetpoint { mode: Mode::Steam, celsius: 180.0 }, &mut sink)
        .unwrap();
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::SetpointChanged { mode: Mode::Steam, celsius: 160.0 })
    );
    assert_eq!(m.boiler().mode_setpoint(Mode::Steam), Some(160.0));

    let err = m
        .handle_command(AppCommand::SetSetpoint { mode: Mode::Off, celsius: 90.0 }, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::OutOfRange("mode")));
}

#[test]
fn gains_command_updates_profile() {
    let (mut m, _rig, _sw, mut sink) = make_machine(90.0);
    let gains = PidGains::new(80.0, 0.1, 200.0);
    m.handle_command(AppCommand::SetGains { mode: Mode::Brew, gains }, &mut sink).unwrap();
    assert_eq!(m.boiler().mode_gains(Mode::Brew), Some(gains));
    assert_eq!(sink.events.last(), Some(&AppEvent::GainsChanged { mode: Mode::Brew, gains }));
}

#[test]
fn commands_parse_from_json() {
    let cmd: AppCommand =
        serde_json::from_str(r#"{"command":"set_setpoint","mode":"brew","celsius":93.5}"#).unwrap();
    assert_eq!(cmd, AppCommand::SetSetpoint { mode: Mode::Brew, celsius: 93.5 });
    let cmd: AppCommand = serde_json::from_str(r#"{"command":"shutdown"}"#).unwrap();
    assert_eq!(cmd, AppCommand::Shutdown);
}

#[test]
fn telemetry_and_ready_lights() {
    let (mut m, rig, mut sw, mut sink) = make_machine(94.0);
    sw.power = true;
    sink.clear();
    tick(&mut m, &rig, &mut sw, &mut sink);

    let Some(AppEvent::Telemetry(t)) = sink.events.last() else {
        panic!("telemetry must be the last event of a tick");
    };
    assert_eq!(t.mode, Mode::Brew);
    assert_eq!(t.setpoint_c, Some(95.0));
    assert!(t.at_setpoint);
    assert!(t.lights.power && t.lights.brew_ready && !t.lights.steam_ready);

    let json = serde_json::to_value(&sink.events.last()).unwrap();
    assert_eq!(json["event"], "telemetry");
    assert_eq!(json["data"]["mode"], "brew");
    assert_eq!(json["data"]["reading"]["celsius"], 94.0);
}

#[test]
fn sensor_bus_failure_propagates_with_heater_off() {
    let (mut m, rig, mut sw, mut sink) = make_machine(60.0);
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    rig.sensor.break_bus();
    rig.clock.advance_ms(1_000);
    assert!(matches!(m.tick(&mut sw, &mut sink), Err(Error::Sensor(_))));
    assert_eq!(rig.heater.last(), Some(0));
    assert_eq!(sink.mode_changes().last(), Some(&(Mode::Brew, Mode::Off)));
}

#[test]
fn heater_write_failure_propagates_with_heater_off() {
    let (mut m, rig, mut sw, mut sink) = make_machine(94.0);
    sw.power = true;
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.boiler().mode(), Mode::Brew);

    rig.heater.fail_nonzero_writes(true);
    sw.pump = true;
    rig.clock.advance_ms(1_000);
    assert!(matches!(m.tick(&mut sw, &mut sink), Err(Error::Actuator(_))));
    assert_eq!(m.boiler().mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));
    assert_eq!(sink.mode_changes().last(), Some(&(Mode::Brew, Mode::Off)));
}

struct BoardSensor(Vec<Option<f32>>);

impl CpuThermometer for BoardSensor {
    fn cpu_temp_c(&mut self) -> Option<f32> {
        if self.0.is_empty() { None } else { self.0.remove(0) }
    }
}

#[test]
fn telemetry_reports_cpu_temperature_when_attached() {
    let (m, rig, mut sw, mut sink) = make_machine(90.0);
    let mut m = m.with_cpu_thermometer(BoardSensor(vec![Some(47.5), None]));
    assert_eq!(m.build_telemetry().cpu_temp_c, None);

    rig.clock.advance_ms(1_000);
    m.tick(&mut sw, &mut sink).unwrap();
    let Some(AppEvent::Telemetry(t)) = sink.events.last() else {
        panic!("telemetry must be the last event of a tick");
    };
    assert_eq!(t.cpu_temp_c, Some(47.5));
    let json = serde_json::to_value(t).unwrap();
    assert_eq!(json["cpu_temp_c"], 47.5);

    rig.clock.advance_ms(1_000);
    m.tick(&mut sw, &mut sink).unwrap();
    assert_eq!(m.build_telemetry().cpu_temp_c, None);
}

#[test]
fn telemetry_without_cpu_thermometer_has_no_cpu_temperature() {
    let (mut m, rig, mut sw, mut sink) = make_machine(90.0);
    tick(&mut m, &rig, &mut sw, &mut sink);
    assert_eq!(m.build_telemetry().cpu_temp_c, None);
    let json = serde_json::to_value(m.build_telemetry()).unwrap();
    assert!(json["cpu_temp_c"].is_null());
}
