//! Actuator and input drivers over `embedded-hal` traits.

pub mod heater;
pub mod switches;
