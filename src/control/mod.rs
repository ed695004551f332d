//! Discrete PID control core.
//!
//! ```text
//!   error ──▶ DiscreteIntegral (trapezoidal, anti-windup) ──┐
//!         ──▶ SlopeEstimator  (least-squares window)      ──┼──▶ PidController ──▶ Clamp ──▶ output
//!         ──▶ Kp · error                                  ──┘
//! ```
//!
//! Everything here is pure arithmetic over `f32` values and monotonic
//! [`Duration`](core::time::Duration) timestamps.  No I/O happens below
//! [`PidController::update`], which pulls one reading from a
//! [`TemperatureSensor`](crate::app::ports::TemperatureSensor).

pub mod clamp;
pub mod integral;
pub mod pid;
pub mod slope;

pub use clamp::Clamp;
pub use integral::DiscreteIntegral;
pub use pid::{PidController, PidGains, PidLimits};
pub use slope::SlopeEstimator;
