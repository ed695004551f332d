//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                  |
//! |-------------|---------------------|------------------------------|
//! | `cpu_temp`  | CpuThermometer      | Linux thermal sysfs zone     |
//! | `json_sink` | EventSink           | JSON lines on any `Write`    |
//! | `log_sink`  | EventSink           | `log` records                |
//! | `sim`       | SpiDevice, SetDutyCycle, Clock, SwitchPort | Simulated boiler plant |
//! | `time`      | Clock               | `std::time::Instant`         |
//!
//! The hardware-facing drivers (`Max31855`, `PwmHeater`, `PanelSwitches`)
//! sit on `embedded-hal` traits and live under `sensors` and `drivers`.

pub mod cpu_temp;
pub mod json_sink;
pub mod log_sink;
pub mod sim;
pub mod time;
