//! Hardware abstraction traits for the LoRaWAN temperature node
//!
//! This crate defines the traits the scheduling core needs from the board:
//! a temperature probe, a LoRaWAN MAC engine and a status display. BSPs
//! implement these traits; the core never touches hardware directly.

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod display;
pub mod probe;
pub mod radio;
pub mod time;

pub use display::{StatusDisplay, STATUS_TEXT_LEN};
pub use probe::{Resolution, TemperatureProbe, DISCONNECTED_RAW, RAW_PER_DEGREE};
pub use radio::{Downlink, LoraMac, MacEvent, MAX_DOWNLINK_LEN};
pub use time::{Duration, Instant};
