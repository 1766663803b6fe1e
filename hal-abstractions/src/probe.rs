//! Temperature probe contract
//!
//! Models a DS18B20-class one-wire probe: a conversion is started, and its
//! result only becomes valid once the resolution-dependent conversion time
//! has elapsed.

use crate::time::Duration;

/// Raw units per degree Celsius (1 LSB = 1/128 °C)
pub const RAW_PER_DEGREE: i16 = 128;

/// Raw value a probe driver reports when no device answers on the bus
///
/// -55 °C in raw units, the bottom of the DS18B20 range.
pub const DISCONNECTED_RAW: i16 = -7040;

/// Probe conversion resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 0.5 °C steps
    Bits9,
    /// 0.25 °C steps
    Bits10,
    /// 0.125 °C steps
    Bits11,
    /// 0.0625 °C steps
    Bits12,
}

impl Resolution {
    /// Resolution for a bit count, if the probe supports it
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            9 => Some(Self::Bits9),
            10 => Some(Self::Bits10),
            11 => Some(Self::Bits11),
            12 => Some(Self::Bits12),
            _ => None,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits9 => 9,
            Self::Bits10 => 10,
            Self::Bits11 => 11,
            Self::Bits12 => 12,
        }
    }

    /// Worst-case conversion time from the DS18B20 datasheet, rounded up
    pub const fn conversion_time(self) -> Duration {
        match self {
            Self::Bits9 => Duration::millis(94),
            Self::Bits10 => Duration::millis(188),
            Self::Bits11 => Duration::millis(375),
            Self::Bits12 => Duration::millis(750),
        }
    }

    /// Size of one resolution step in raw units
    pub const fn step_raw(self) -> i16 {
        match self {
            Self::Bits9 => 64,
            Self::Bits10 => 32,
            Self::Bits11 => 16,
            Self::Bits12 => 8,
        }
    }
}

/// Two-phase temperature probe
pub trait TemperatureProbe {
    /// Configure the conversion resolution
    fn set_resolution(&mut self, resolution: Resolution);

    /// Start a conversion and return immediately
    fn start_conversion(&mut self);

    /// Read the last converted value in raw units
    ///
    /// Only meaningful once the conversion time has elapsed since
    /// [`start_conversion`](Self::start_conversion). Returns
    /// [`DISCONNECTED_RAW`] when the probe does not answer.
    fn read_converted(&mut self) -> i16;
}
