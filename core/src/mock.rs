//! Test doubles for the board collaborators

use core::cell::Cell;
use core::convert::Infallible;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use hal_abstractions::{
    Duration, Instant, LoraMac, MacEvent, Resolution, StatusDisplay, TemperatureProbe,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOp {
    Start,
    Read(i16),
}

/// Probe returning a scripted sequence of raw values, repeating the last one
pub struct MockProbe {
    values: Vec<i16>,
    next: usize,
    pub resolution: Option<Resolution>,
    pub conversions_started: u32,
    pub ops: Vec<ProbeOp>,
}

impl MockProbe {
    pub fn new(values: &[i16]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
            resolution: None,
            conversions_started: 0,
            ops: Vec::new(),
        }
    }
}

impl TemperatureProbe for MockProbe {
    fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = Some(resolution);
    }

    fn start_conversion(&mut self) {
        self.conversions_started += 1;
        self.ops.push(ProbeOp::Start);
    }

    fn read_converted(&mut self) -> i16 {
        let index = self.next.min(self.values.len().saturating_sub(1));
        let value = self.values.get(index).copied().unwrap_or(0);
        self.next += 1;
        self.ops.push(ProbeOp::Read(value));
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MockMacError;

/// MAC with a scripted event timeline and a controllable busy flag
pub struct MockMac {
    pub tx_pending: bool,
    pub reject_submissions: bool,
    /// Schedule a `TxComplete` this long after every accepted submission
    pub complete_after: Option<Duration>,
    pub submissions: Vec<(u8, Vec<u8>)>,
    pub guard_queries: Cell<u32>,
    pub joins_started: u32,
    pub link_check: Option<bool>,
    pub in_flight: u32,
    pub max_in_flight: u32,
    events: Vec<(Instant, MacEvent)>,
    last_poll: Instant,
}

impl MockMac {
    pub fn new() -> Self {
        Self {
            tx_pending: false,
            reject_submissions: false,
            complete_after: None,
            submissions: Vec::new(),
            guard_queries: Cell::new(0),
            joins_started: 0,
            link_check: None,
            in_flight: 0,
            max_in_flight: 0,
            events: Vec::new(),
            last_poll: Instant::from_ticks(0),
        }
    }

    /// Queue `event` for delivery at `at`, after anything already queued for that time
    pub fn push_event(&mut self, at: Instant, event: MacEvent) {
        let index = self.events.partition_point(|(due, _)| *due <= at);
        self.events.insert(index, (at, event));
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl LoraMac for MockMac {
    type Error = MockMacError;

    fn begin_join(&mut self) {
        self.joins_started += 1;
    }

    fn submit(&mut self, port: u8, payload: &[u8]) -> Result<(), Self::Error> {
        if self.reject_submissions {
            return Err(MockMacError);
        }
        self.submissions.push((port, payload.to_vec()));
        self.tx_pending = true;
        self.in_flight += 1;
        self.max_in_flight = self.max_in_flight.max(self.in_flight);
        if let Some(after) = self.complete_after {
            let at = self.last_poll + after;
            self.push_event(
                at,
                MacEvent::TxComplete {
                    ack: false,
                    downlink: None,
                },
            );
        }
        Ok(())
    }

    fn is_tx_pending(&self) -> bool {
        self.guard_queries.set(self.guard_queries.get() + 1);
        self.tx_pending
    }

    fn set_link_check(&mut self, enabled: bool) {
        self.link_check = Some(enabled);
    }

    fn poll_event(&mut self, now: Instant) -> Option<MacEvent> {
        self.last_poll = now;
        let (due, _) = self.events.first()?;
        if *due > now {
            return None;
        }
        let (_, event) = self.events.remove(0);
        if matches!(event, MacEvent::TxComplete { .. }) {
            self.tx_pending = false;
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        Some(event)
    }

    fn next_wakeup(&self) -> Option<Instant> {
        self.events.first().map(|(due, _)| *due)
    }
}

#[derive(Default)]
pub struct MockDisplay {
    pub lines: Vec<String>,
}

impl MockDisplay {
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

impl StatusDisplay for MockDisplay {
    fn show(&mut self, text: &str) {
        self.lines.push(text.into());
    }
}

#[derive(Default)]
pub struct MockLed {
    pub is_high: bool,
    pub rising_edges: u32,
}

impl MockLed {
    pub fn high() -> Self {
        Self {
            is_high: true,
            rising_edges: 0,
        }
    }
}

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.is_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.is_high {
            self.rising_edges += 1;
        }
        self.is_high = true;
        Ok(())
    }
}

/// Delay that only adds up how long it was asked to wait
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
