//! Integration tests for the Boiler → PID → heater pipeline.

use latte_boiler::config::BoilerConfig;
use latte_boiler::control::PidGains;
use latte_boiler::error::{ActuatorError, Error, SensorError};
use latte_boiler::sensors::ThermocoupleFault;
use latte_boiler::Mode;

use super::mock_hw::Rig;

#[test]
fn brew_at_setpoint_outputs_only_feed_forward() {
    let rig = Rig::new(95.0);
    let config = BoilerConfig::default();
    assert_eq!(config.brew.setpoint_c, 95.0);
    assert_eq!(config.brew.gains, PidGains::new(100.0, 0.25, 250.0));

    let mut boiler = rig.boiler(&config);
    boiler.set_mode(Mode::Brew).unwrap();
    assert_eq!(boiler.current_command(), 0);

    rig.clock.advance_ms(1_000);
    assert_eq!(boiler.update(128.0).unwrap(), 128);
    assert_eq!(rig.heater.last(), Some(128));
}

#[test]
fn off_transition_zeroes_heater_on_next_update() {
    let rig = Rig::new(30.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    boiler.set_mode(Mode::Steam).unwrap();
    for _ in 0..5 {
        rig.clock.advance_ms(1_000);
        boiler.update(0.0).unwrap();
    }
    assert_eq!(rig.heater.last(), Some(255));

    boiler.set_mode(Mode::Off).unwrap();
    let writes_before = rig.heater.write_count();
    assert_eq!(boiler.update(128.0).unwrap(), 0);
    assert_eq!(rig.heater.write_count(), writes_before + 1);
    assert_eq!(rig.heater.last(), Some(0));
}

#[test]
fn repeated_command_is_written_once() {
    let rig = Rig::new(94.0);
    let mut config = BoilerConfig::default();
    config.brew.gains = PidGains::new(50.0, 0.0, 0.0);
    let mut boiler = rig.boiler(&config);

    boiler.set_mode(Mode::Brew).unwrap();
    for _ in 0..4 {
        rig.clock.advance_ms(1_000);
        assert_eq!(boiler.update(0.0).unwrap(), 50);
    }
    // Construction zero, then a single 50.
    assert_eq!(rig.heater.writes(), vec![0, 50]);
}

#[test]
fn updates_inside_min_interval_do_not_touch_sensor() {
    let rig = Rig::new(90.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    boiler.set_mode(Mode::Brew).unwrap();
    let reads = rig.sensor.reads();
    let first = boiler.current_output();

    rig.clock.advance_ms(100);
    rig.sensor.set(20.0);
    boiler.update(0.0).unwrap();
    assert_eq!(boiler.current_output(), first);
    assert_eq!(rig.sensor.reads(), reads);
}

#[test]
fn mode_switch_brew_to_steam_reseeds_on_next_update() {
    let rig = Rig::new(92.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    boiler.set_mode(Mode::Brew).unwrap();
    for k in 0..5 {
        rig.clock.advance_ms(1_000);
        rig.sensor.set(92.0 + k as f32 * 0.5);
        boiler.update(0.0).unwrap();
    }
    assert!(boiler.error_sum() > 0.0);
    assert!(boiler.error_slope() < 0.0);

    boiler.set_mode(Mode::Steam).unwrap();
    rig.clock.advance_ms(1_000);
    boiler.update(0.0).unwrap();
    assert_eq!(boiler.setpoint(), Some(140.0));
    assert_eq!(boiler.error_sum(), 0.0);
    assert_eq!(boiler.error_slope(), 0.0);
}

#[test]
fn integral_never_exceeds_windup_limit() {
    let rig = Rig::new(20.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    boiler.set_mode(Mode::Brew).unwrap();
    for _ in 0..50 {
        rig.clock.advance_ms(1_000);
        boiler.update(0.0).unwrap();
        assert!(boiler.error_sum() <= 100.0);
    }
    assert_eq!(boiler.error_sum(), 100.0);
}

#[test]
fn thermocouple_fault_holds_command_and_recovers() {
    let rig = Rig::new(93.0);
    let mut config = BoilerConfig::default();
    config.brew.gains = PidGains::new(20.0, 0.0, 0.0);
    let mut boiler = rig.boiler(&config);
    boiler.set_mode(Mode::Brew).unwrap();
    assert_eq!(boiler.current_command(), 40);

    rig.sensor.fault(ThermocoupleFault::ShortToVcc);
    for _ in 0..3 {
        rig.clock.advance_ms(1_000);
        assert_eq!(boiler.update(0.0).unwrap(), 40);
    }
    assert_eq!(boiler.current_temp(), None);

    rig.sensor.set(94.0);
    rig.clock.advance_ms(1_000);
    assert_eq!(boiler.update(0.0).unwrap(), 20);
}

#[test]
fn bus_failure_turns_heater_off_and_reports() {
    let rig = Rig::new(50.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    boiler.set_mode(Mode::Brew).unwrap();
    assert_eq!(rig.heater.last(), Some(255));

    rig.sensor.break_bus();
    rig.clock.advance_ms(1_000);
    let err = boiler.update(0.0).unwrap_err();
    assert!(matches!(err, Error::Sensor(SensorError::Transport(_))));
    assert_eq!(boiler.mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));
}

#[test]
fn heater_write_failure_turns_boiler_off() {
    let rig = Rig::new(94.0);
    let mut config = BoilerConfig::default();
    config.brew.gains = PidGains::new(10.0, 0.0, 0.0);
    let mut boiler = rig.boiler(&config);
    boiler.set_mode(Mode::Brew).unwrap();
    assert_eq!(rig.heater.writes(), vec![0, 10]);

    rig.heater.fail_nonzero_writes(true);
    boiler.set_setpoint(Mode::Brew, 100.0).unwrap();
    rig.clock.advance_ms(1_000);
    let err = boiler.update(0.0).unwrap_err();
    assert_eq!(err, Error::Actuator(ActuatorError::PwmWriteFailed));
    assert_eq!(boiler.mode(), Mode::Off);
    assert_eq!(boiler.current_command(), 0);
    assert_eq!(rig.heater.writes(), vec![0, 10, 0]);
}

#[test]
fn heater_write_failure_on_power_up_keeps_boiler_off() {
    let rig = Rig::new(20.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    rig.heater.fail_nonzero_writes(true);
    assert_eq!(
        boiler.set_mode(Mode::Steam),
        Err(Error::Actuator(ActuatorError::PwmWriteFailed))
    );
    assert_eq!(boiler.mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));
}

#[test]
fn bus_failure_on_power_up_keeps_boiler_off() {
    let rig = Rig::new(50.0);
    let mut boiler = rig.boiler(&BoilerConfig::default());
    rig.sensor.break_bus();
    assert!(boiler.set_mode(Mode::Brew).is_err());
    assert_eq!(boiler.mode(), Mode::Off);
    assert_eq!(rig.heater.last(), Some(0));
}

#[test]
fn dropping_boiler_turns_heater_off() {
    let rig = Rig::new(20.0);
    {
        let mut boiler = rig.boiler(&BoilerConfig::default());
        boiler.set_mode(Mode::Brew).unwrap();
        assert_eq!(rig.heater.last(), Some(255));
    }
    assert_eq!(rig.heater.last(), Some(0));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let rig = Rig::new(20.0);
    let mut config = BoilerConfig::default();
    config.brew.setpoint_c = 200.0;
    let res = latte_boiler::Boiler::new(
        rig.sensor.clone(),
        rig.heater.clone(),
        rig.clock.clone(),
        &config,
    );
    assert!(matches!(res, Err(Error::Config(_))));
    assert_eq!(rig.heater.write_count(), 0);
}

#[test]
fn output_limit_below_heater_scale_caps_command() {
    let rig = Rig::new(20.0);
    let mut config = BoilerConfig::default();
    config.output_limits = latte_boiler::control::Clamp::new(0.0, 200.0).unwrap();
    let mut boiler = rig.boiler(&config);
    boiler.set_mode(Mode::Brew).unwrap();
    assert_eq!(boiler.current_command(), 200);
}
