//! Application core: boiler coordination, zero I/O.
//!
//! This module contains the machine-level rules: mapping switches to a
//! mode, pump feed-forward, safety interlocks and telemetry.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
