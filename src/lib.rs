//! Espresso machine boiler controller.
//!
//! A MAX31855 thermocouple decoder, a rate-limited PID loop with
//! anti-windup and regression-based derivative, and an Off/Brew/Steam
//! boiler state machine that guarantees the heater is off whenever the
//! boiler is inactive.  Everything above the `embedded-hal` traits is
//! plain host-testable Rust.

#![deny(unused_must_use)]

pub mod app;
pub mod boiler;
pub mod config;
pub mod control;
pub mod error;
pub mod safety;

pub mod adapters;
pub mod drivers;
pub mod sensors;

pub use boiler::{Boiler, Mode};
pub use error::{Error, Result};
