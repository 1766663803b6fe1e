//! Platform-agnostic scheduling core for the LoRaWAN temperature node
//!
//! This crate contains the node's business logic: a probe acquisition cycle,
//! a transmit cadence driven by MAC completion events, and the run loop that
//! ties them together. It has NO hardware dependencies; boards provide the
//! probe, MAC, display and LED through `hal-abstractions` and `embedded-hal`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

// Must come first so the logging macros are visible in every module
#[macro_use]
mod fmt;

pub mod acquisition;
pub mod config;
pub mod dispatcher;
pub mod job;
pub mod node;
pub mod payload;
pub mod record;
pub mod transmission;

#[cfg(test)]
mod mock;

pub use config::{ConfigError, NodeConfig};
pub use job::{Job, JobKind, JobTable};
pub use node::{Node, NodeStatus};
pub use payload::{decode_uplink, DecodeError, Uplink};
pub use record::ReadingRecord;
pub use transmission::AttemptOutcome;
