//! The shared reading record and its revision 3 wire layout
//!
//! ```text
//! byte 0      schema revision
//! byte 1      device id
//! byte 2..3   temperature, i16 little-endian, 1 LSB = 1/128 °C
//! ```

use core::fmt::Write;

use hal_abstractions::{DISCONNECTED_RAW, RAW_PER_DEGREE, STATUS_TEXT_LEN};
use heapless::String;

/// Encoded size of a [`ReadingRecord`]
pub const RECORD_LEN: usize = 4;

/// Latest harvested probe value plus the identifiers the decoder needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingRecord {
    pub schema_revision: u8,
    pub device_id: u8,
    /// Probe-native fixed point, 1/128 °C
    pub temperature_raw: i16,
}

impl ReadingRecord {
    /// Record that has not seen a harvest yet
    pub const fn new(schema_revision: u8, device_id: u8) -> Self {
        Self {
            schema_revision,
            device_id,
            temperature_raw: 0,
        }
    }

    pub const fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let raw = self.temperature_raw.to_le_bytes();
        [self.schema_revision, self.device_id, raw[0], raw[1]]
    }

    pub const fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        Self {
            schema_revision: bytes[0],
            device_id: bytes[1],
            temperature_raw: i16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    pub fn celsius(&self) -> f32 {
        raw_to_celsius(self.temperature_raw)
    }

    /// The probe did not answer when this value was harvested
    pub const fn is_disconnected(&self) -> bool {
        self.temperature_raw == DISCONNECTED_RAW
    }

    /// Display line: `=<°C><device letter><revision>`, e.g. `=21.25b3`
    ///
    /// A disconnected probe renders as `=----b3`.
    pub fn status_line(&self) -> String<STATUS_TEXT_LEN> {
        let mut line = String::new();
        let letter = char::from(b'a'.wrapping_add(self.device_id));
        // Longest possible line is 13 bytes, the capacity is 16
        let _ = if self.is_disconnected() {
            write!(line, "=----{}{}", letter, self.schema_revision)
        } else {
            write!(
                line,
                "={:.2}{}{}",
                self.celsius(),
                letter,
                self.schema_revision
            )
        };
        line
    }
}

/// Convert probe-native raw units to degrees Celsius
pub fn raw_to_celsius(raw: i16) -> f32 {
    f32::from(raw) / f32::from(RAW_PER_DEGREE)
}
