//! Network-side uplink decoder
//!
//! Mirrors the decoder the network server runs, so the node's encoding can be
//! checked end to end. The FPort selects the layout:
//!
//! - port 1: retired, carries no decodable data
//! - port 2: retired, a bare array of little-endian raw temperatures
//! - port 3: the current [`ReadingRecord`] layout
//!
//! Only port 3 is produced by this firmware.

use heapless::Vec;

use crate::record::{raw_to_celsius, ReadingRecord, RECORD_LEN};

/// First FPort layout, no longer decodable
pub const RETIRED_PORT: u8 = 1;

/// FPort of the retired raw-array layout
pub const RAW_ARRAY_PORT: u8 = 2;

/// FPort of the current layout (equal to its schema revision)
pub const READING_PORT: u8 = 3;

/// Largest number of readings a raw-array uplink can carry (222-byte payload)
pub const MAX_RAW_ARRAY_ITEMS: usize = 111;

/// Decoded uplink
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Uplink {
    /// Port 1 frame, reported but not decoded
    Retired,
    /// Port 2 frame
    RawArray {
        temperatures: Vec<f32, MAX_RAW_ARRAY_ITEMS>,
    },
    /// Port 3 frame
    Reading {
        record: ReadingRecord,
        /// Degrees Celsius
        temperature: f32,
    },
}

/// Uplink decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// FPort without a known layout
    UnknownPort(u8),
    /// Payload shorter than its layout requires
    Truncated { expected: usize, actual: usize },
    /// Raw-array payload with more items than a frame can carry
    TooManyItems(usize),
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownPort(port) => write!(f, "Unknown fport value {}", port),
            Self::Truncated { expected, actual } => {
                write!(f, "Payload truncated: expected {} bytes, got {}", expected, actual)
            }
            Self::TooManyItems(items) => write!(f, "Too many items: {}", items),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Decode an uplink received on `port`
pub fn decode_uplink(port: u8, bytes: &[u8]) -> Result<Uplink, DecodeError> {
    match port {
        RETIRED_PORT => Ok(Uplink::Retired),
        RAW_ARRAY_PORT => decode_raw_array(bytes),
        READING_PORT => decode_reading(bytes),
        other => Err(DecodeError::UnknownPort(other)),
    }
}

fn decode_raw_array(bytes: &[u8]) -> Result<Uplink, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::Truncated {
            expected: bytes.len() + 1,
            actual: bytes.len(),
        });
    }
    let items = bytes.len() / 2;
    if items > MAX_RAW_ARRAY_ITEMS {
        return Err(DecodeError::TooManyItems(items));
    }

    let mut temperatures = Vec::new();
    for pair in bytes.chunks_exact(2) {
        let raw = i16::from_le_bytes([pair[0], pair[1]]);
        // Capacity checked above
        let _ = temperatures.push(raw_to_celsius(raw));
    }
    Ok(Uplink::RawArray { temperatures })
}

fn decode_reading(bytes: &[u8]) -> Result<Uplink, DecodeError> {
    let Some(head) = bytes.first_chunk::<RECORD_LEN>() else {
        return Err(DecodeError::Truncated {
            expected: RECORD_LEN,
            actual: bytes.len(),
        });
    };
    let record = ReadingRecord::from_bytes(*head);
    Ok(Uplink::Reading {
        record,
        temperature: record.celsius(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_decodes_to_celsius() {
        let record = ReadingRecord {
            schema_revision: 3,
            device_id: 1,
            temperature_raw: 256,
        };
        let uplink = decode_uplink(READING_PORT, &record.to_bytes()).unwrap();
        assert_eq!(
            uplink,
            Uplink::Reading {
                record,
                temperature: 2.0
            }
        );
    }

    #[test]
    fn test_reading_keeps_sign() {
        let uplink = decode_uplink(READING_PORT, &[3, 1, 0x00, 0xFF]).unwrap();
        match uplink {
            Uplink::Reading { temperature, .. } => assert_eq!(temperature, -2.0),
            other => panic!("unexpected uplink {:?}", other),
        }
    }

    #[test]
    fn test_reading_truncated() {
        assert_eq!(
            decode_uplink(READING_PORT, &[3, 1, 0]),
            Err(DecodeError::Truncated {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_raw_array() {
        // 2.0 °C, 0.5 °C, -1.0 °C
        let bytes = [0x00, 0x01, 0x40, 0x00, 0x80, 0xFF];
        let uplink = decode_uplink(RAW_ARRAY_PORT, &bytes).unwrap();
        match uplink {
            Uplink::RawArray { temperatures } => {
                assert_eq!(temperatures.as_slice(), &[2.0, 0.5, -1.0]);
            }
            other => panic!("unexpected uplink {:?}", other),
        }
    }

    #[test]
    fn test_raw_array_odd_length() {
        assert!(matches!(
            decode_uplink(RAW_ARRAY_PORT, &[0x00, 0x01, 0x40]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_raw_array_too_long() {
        let bytes = [0u8; 2 * (MAX_RAW_ARRAY_ITEMS + 1)];
        assert_eq!(
            decode_uplink(RAW_ARRAY_PORT, &bytes),
            Err(DecodeError::TooManyItems(MAX_RAW_ARRAY_ITEMS + 1))
        );
    }

    #[test]
    fn test_retired_and_unknown_ports() {
        assert_eq!(decode_uplink(RETIRED_PORT, &[1, 2, 3]), Ok(Uplink::Retired));
        assert_eq!(
            decode_uplink(9, &[]),
            Err(DecodeError::UnknownPort(9))
        );
    }
}
