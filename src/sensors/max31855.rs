//! MAX31855 cold-junction compensated thermocouple-to-digital converter.
//!
//! The chip clocks out a read-only 32-bit big-endian frame:
//!
//! ```text
//!  31 | 30..18 | 17 | 16 | 15 | 14..4 | 3 |  2  |  1  |  0
//!  ───┴────────┴────┴────┴────┴───────┴───┴─────┴─────┴────
//!  thermocouple    rsv  F  internal (ref)  rsv SCV   SCG   OC
//!  14-bit, 0.25 °C          12-bit, 0.0625 °C
//! ```
//!
//! Decoding is a pure function of the frame ([`decode`]); the
//! [`Max31855`] driver only adds the SPI transfer and fault-change logging.

use embedded_hal::spi::{Error as _, SpiDevice};
use log::{info, warn};

use super::{TemperatureReading, ThermocoupleFault};
use crate::app::ports::TemperatureSensor;
use crate::error::SensorError;

const FAULT_OPEN_CIRCUIT: u32 = 1 << 0;
const FAULT_SHORT_GND: u32 = 1 << 1;
const FAULT_SHORT_VCC: u32 = 1 << 2;
const FAULT_FLAG: u32 = 1 << 16;

const THERMO_SHIFT: u32 = 18;
const THERMO_BITS: u32 = 14;
const THERMO_LSB_C: f32 = 0.25;

const INTERNAL_SHIFT: u32 = 4;
const INTERNAL_BITS: u32 = 12;
const INTERNAL_LSB_C: f32 = 0.0625;

/// A floating MISO line reads back as all ones.
const DEAD_BUS_FRAME: u32 = 0xFFFF_FFFF;

/// Result of decoding one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    Temperatures { thermocouple_c: f32, internal_c: f32 },
    Fault(ThermocoupleFault),
}

impl Decoded {
    pub fn reading(self) -> TemperatureReading {
        match self {
            Self::Temperatures { thermocouple_c, .. } => TemperatureReading::Celsius(thermocouple_c),
            Self::Fault(f) => TemperatureReading::Unavailable(f),
        }
    }
}

/// Reinterpret the low `width` bits of `field` as two's complement.
pub const fn sign_extend(field: u32, width: u32) -> i32 {
    let shift = 32 - width;
    ((field << shift) as i32) >> shift
}

/// Decode a 4-byte frame as clocked out of the chip (MSB first).
///
/// An all-zero frame means nothing answered and is distinct from a real
/// 0 °C reading, which always carries a non-zero internal temperature in
/// practice.  Fault bits take priority over any temperature field: open
/// circuit, then short to GND, then short to VCC.
pub fn decode(frame: [u8; 4]) -> Decoded {
    let raw = u32::from_be_bytes(frame);
    if raw == 0 {
        return Decoded::Fault(ThermocoupleFault::NoData);
    }

    if raw & FAULT_OPEN_CIRCUIT != 0 {
        return Decoded::Fault(ThermocoupleFault::OpenCircuit);
    }
    if raw & FAULT_SHORT_GND != 0 {
        return Decoded::Fault(ThermocoupleFault::ShortToGround);
    }
    if raw & FAULT_SHORT_VCC != 0 {
        return Decoded::Fault(ThermocoupleFault::ShortToVcc);
    }

    let internal = sign_extend((raw >> INTERNAL_SHIFT) & field_mask(INTERNAL_BITS), INTERNAL_BITS);
    let thermo = sign_extend((raw >> THERMO_SHIFT) & field_mask(THERMO_BITS), THERMO_BITS);

    Decoded::Temperatures {
        thermocouple_c: thermo as f32 * THERMO_LSB_C,
        internal_c: internal as f32 * INTERNAL_LSB_C,
    }
}

/// Build the frame the chip would send for the given temperatures.
///
/// Values are rounded to the field resolution and saturate at the field
/// range.  Note that `encode_frame(0.0, 0.0)` is the all-zero frame and
/// therefore decodes as [`ThermocoupleFault::NoData`].
pub fn encode_frame(thermocouple_c: f32, internal_c: f32) -> [u8; 4] {
    let thermo = quantise(thermocouple_c, THERMO_LSB_C, THERMO_BITS);
    let internal = quantise(internal_c, INTERNAL_LSB_C, INTERNAL_BITS);
    let raw = ((thermo as u32 & field_mask(THERMO_BITS)) << THERMO_SHIFT)
        | ((internal as u32 & field_mask(INTERNAL_BITS)) << INTERNAL_SHIFT);
    raw.to_be_bytes()
}

/// Build a frame reporting `fault`, with the summary fault flag set.
pub fn encode_fault(fault: ThermocoupleFault) -> [u8; 4] {
    let bits = match fault {
        ThermocoupleFault::OpenCircuit => FAULT_FLAG | FAULT_OPEN_CIRCUIT,
        ThermocoupleFault::ShortToGround => FAULT_FLAG | FAULT_SHORT_GND,
        ThermocoupleFault::ShortToVcc => FAULT_FLAG | FAULT_SHORT_VCC,
        ThermocoupleFault::NoData => 0,
    };
    bits.to_be_bytes()
}

const fn field_mask(width: u32) -> u32 {
    (1 << width) - 1
}

fn quantise(celsius: f32, lsb: f32, width: u32) -> i32 {
    let max = (1_i32 << (width - 1)) - 1;
    let min = -(1_i32 << (width - 1));
    if celsius.is_nan() {
        return 0;
    }
    // `as` saturates on overflow, the clamp narrows to the field.
    ((celsius / lsb).round() as i32).clamp(min, max)
}

// ---------------------------------------------------------------------------
// SPI driver
// ---------------------------------------------------------------------------

/// MAX31855 on an `embedded-hal` SPI device (mode 0, up to 5 MHz).
pub struct Max31855<SPI> {
    spi: SPI,
    internal_c: Option<f32>,
    last_fault: Option<ThermocoupleFault>,
}

impl<SPI: SpiDevice> Max31855<SPI> {
    /// Take ownership of the bus and probe the chip once.
    ///
    /// Fails if the transfer errors or the bus reads back as all ones.
    pub fn new(spi: SPI) -> Result<Self, SensorError> {
        let mut dev = Self {
            spi,
            internal_c: None,
            last_fault: None,
        };
        let frame = dev.read_frame()?;
        if u32::from_be_bytes(frame) == DEAD_BUS_FRAME {
            warn!("MAX31855: probe read all ones, no device on bus");
            return Err(SensorError::ProbeFailed);
        }
        match decode(frame) {
            Decoded::Temperatures { thermocouple_c, internal_c } => {
                dev.internal_c = Some(internal_c);
                info!("MAX31855: online, thermocouple {thermocouple_c:.2} °C, internal {internal_c:.2} °C");
            }
            Decoded::Fault(f) => {
                dev.last_fault = Some(f);
                warn!("MAX31855: online with fault: {f}");
            }
        }
        Ok(dev)
    }

    /// One raw 4-byte transfer.
    pub fn read_frame(&mut self) -> Result<[u8; 4], SensorError> {
        let mut buf = [0_u8; 4];
        self.spi
            .read(&mut buf)
            .map_err(|e| SensorError::Transport(e.kind()))?;
        Ok(buf)
    }

    pub fn read_decoded(&mut self) -> Result<Decoded, SensorError> {
        let decoded = decode(self.read_frame()?);
        let fault = match decoded {
            Decoded::Temperatures { internal_c, .. } => {
                self.internal_c = Some(internal_c);
                None
            }
            Decoded::Fault(f) => Some(f),
        };
        if fault != self.last_fault {
            match fault {
                Some(f) => warn!("MAX31855: {f}"),
                None => info!("MAX31855: fault cleared"),
            }
            self.last_fault = fault;
        }
        Ok(decoded)
    }

    /// Cold-junction temperature from the last good frame.
    pub fn internal_temperature(&self) -> Option<f32> {
        self.internal_c
    }

    /// Give the bus back.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> TemperatureSensor for Max31855<SPI> {
    fn read(&mut self) -> Result<TemperatureReading, SensorError> {
        self.read_decoded().map(Decoded::reading)
    }
}
