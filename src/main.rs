//! Latte boiler: host simulation entry point.
//!
//! Runs the full stack against a simulated boiler plant:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                       │
//! │                                                              │
//! │  SimSpi ─▶ Max31855     SimPwm ─▶ PwmHeater     SimClock     │
//! │  ScriptedPanel          LogEventSink + JsonEventSink         │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │        EspressoMachine (pure logic)                │      │
//! │  │  Mode · Safety · Boiler · PID                      │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `latte-boiler-sim [config.json]`.  Logs go to stderr
//! (`RUST_LOG` controls the level), telemetry JSON lines to stdout.

use std::io::{self, StdoutLock};

use anyhow::{Context, Result};
use log::{info, warn};

use latte_boiler::adapters::cpu_temp::SysfsCpuThermometer;
use latte_boiler::adapters::json_sink::JsonEventSink;
use latte_boiler::adapters::log_sink::LogEventSink;
use latte_boiler::adapters::sim::{
    ScriptedPanel, SimClock, SimPwm, SimSpi, ThermalModel, shared_plant,
};
use latte_boiler::app::commands::AppCommand;
use latte_boiler::app::events::AppEvent;
use latte_boiler::app::ports::EventSink;
use latte_boiler::app::service::EspressoMachine;
use latte_boiler::config::BoilerConfig;
use latte_boiler::drivers::heater::PwmHeater;
use latte_boiler::sensors::ThermocoupleFault;
use latte_boiler::sensors::max31855::Max31855;
use latte_boiler::{Boiler, Error, Mode};

/// Human-readable log plus machine-readable JSON for every event.
struct ConsoleSink<'a> {
    log: LogEventSink,
    json: JsonEventSink<StdoutLock<'a>>,
}

impl EventSink for ConsoleSink<'_> {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        self.json.emit(event);
    }
}

/// One step of the scripted session.
enum Step {
    Panel { power: bool, steam: bool, pump: bool },
    Command(AppCommand),
    Fault(Option<ThermocoupleFault>),
    Run(u32),
}

fn script() -> Vec<Step> {
    use Step::{Command, Fault, Panel, Run};
    vec![
        Run(5),
        Panel { power: true, steam: false, pump: false },
        Run(240),
        // Pull a shot: the pump draws cold water and feed-forward kicks in.
        Panel { power: true, steam: false, pump: true },
        Run(30),
        Panel { power: true, steam: false, pump: false },
        Run(60),
        Panel { power: true, steam: true, pump: false },
        Run(180),
        Panel { power: true, steam: false, pump: false },
        Command(AppCommand::SetSetpoint { mode: Mode::Brew, celsius: 93.0 }),
        Run(120),
        // Thermocouple lead comes loose for a while.
        Fault(Some(ThermocoupleFault::OpenCircuit)),
        Run(8),
        Fault(None),
        Run(30),
        Command(AppCommand::Shutdown),
        Run(5),
        Panel { power: false, steam: false, pump: false },
        Run(10),
    ]
}

fn load_config() -> Result<BoilerConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(BoilerConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: BoilerConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    config.validate().map_err(Error::from)?;
    info!("Loaded configuration from {path}");
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    info!("Latte boiler simulation starting");
    let config = load_config()?;
    let tick = config.tick_interval();

    // ── Hardware (simulated) ─────────────────────────────────
    let plant = shared_plant(ThermalModel::default());
    let clock = SimClock::new();
    let sensor = Max31855::new(SimSpi::new(plant.clone()))
        .map_err(Error::from)
        .context("thermocouple probe")?;
    let heater = PwmHeater::new(SimPwm::new(plant.clone()))
        .map_err(Error::from)
        .context("heater init")?;
    let mut panel = ScriptedPanel::new(plant.clone());

    // ── Core ─────────────────────────────────────────────────
    let boiler = Boiler::new(sensor, heater, clock.clone(), &config)?;
    let mut machine =
        EspressoMachine::new(boiler, &config).with_cpu_thermometer(SysfsCpuThermometer::new());
    let mut sink = ConsoleSink {
        log: LogEventSink::new(),
        json: JsonEventSink::new(io::stdout().lock()),
    };
    machine.start(&mut sink);

    for step in script() {
        match step {
            Step::Panel { power, steam, pump } => panel.set(power, steam, pump),
            Step::Command(cmd) => machine.handle_command(cmd, &mut sink)?,
            Step::Fault(fault) => {
                if let Some(f) = fault {
                    warn!("sim: injecting thermocouple fault: {f}");
                }
                plant.borrow_mut().fault = fault;
            }
            Step::Run(ticks) => {
                for _ in 0..ticks {
                    plant.borrow_mut().step(tick);
                    clock.advance(tick);
                    machine.tick(&mut panel, &mut sink)?;
                }
            }
        }
    }

    let t = machine.build_telemetry();
    info!(
        "Simulation finished after {} ticks: mode={} command={} plant={:.1}\u{00b0}C",
        t.tick,
        t.mode,
        t.command,
        plant.borrow().temp_c
    );
    Ok(())
}
