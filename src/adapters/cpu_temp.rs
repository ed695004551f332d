//! Controller board temperature from the Linux thermal sysfs interface.
//!
//! The kernel reports millidegrees Celsius as a decimal integer, e.g.
//! `48312\n` for 48.312 °C.

use std::path::PathBuf;

use log::warn;

use crate::app::ports::CpuThermometer;

const DEFAULT_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

pub struct SysfsCpuThermometer {
    path: PathBuf,
    /// Set after the first failed read so a missing zone warns once.
    warned: bool,
}

impl Default for SysfsCpuThermometer {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsCpuThermometer {
    /// Thermal zone 0, the SoC sensor on single-board computers.
    pub fn new() -> Self {
        Self::with_path(DEFAULT_ZONE)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), warned: false }
    }

    fn read_millidegrees(&self) -> Option<f32> {
        let text = std::fs::read_to_string(&self.path).ok()?;
        text.trim().parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

impl CpuThermometer for SysfsCpuThermometer {
    fn cpu_temp_c(&mut self) -> Option<f32> {
        match self.read_millidegrees() {
            Some(milli) => {
                self.warned = false;
                Some(milli / 1000.0)
            }
            None => {
                if !self.warned {
                    warn!("cpu: no temperature at {}", self.path.display());
                    self.warned = true;
                }
                None
            }
        }
    }
}
