//! Simulated LoRaWAN MAC engine
//!
//! A single-channel stand-in for an LMIC-style MAC. It keeps the parts of
//! the real thing the node can observe:
//!
//! - OTAA join with a lossy network, retried with growing back-off and a
//!   `JoinFailed` after every few unanswered requests
//! - one data frame in flight at a time, reported busy until `TxComplete`
//! - 1% duty cycle, so a frame queued right after the previous one waits
//!   for its off-time
//! - both RX windows closing before `TxComplete`, sometimes with an ack or
//!   a downlink
//!
//! The engine is driven purely by the `now` handed to [`LoraMac::poll_event`];
//! it never reads a clock itself.

use core::fmt;

use hal_abstractions::{Downlink, Duration, Instant, LoraMac, MacEvent};
use heapless::{Deque, Vec};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest FRMPayload accepted at SF9/125 kHz, EU868
pub const MAX_UPLINK_LEN: usize = 115;

const EVENT_QUEUE_LEN: usize = 8;

/// Tuning knobs of the simulated network
#[derive(Debug, Clone, Copy)]
pub struct SimMacConfig {
    /// Chance a join request is answered
    pub join_accept_probability: f64,
    /// Unanswered join requests between two `JoinFailed` reports
    pub join_attempts_per_failure: u32,
    /// Wait before the first join retry, doubled up to `max_join_backoff`
    pub join_backoff: Duration,
    pub max_join_backoff: Duration,
    /// Chance the network sends something back in an RX window
    pub downlink_probability: f64,
    /// Transmit time of a data frame
    pub data_airtime: Duration,
    /// Transmit time of a join request
    pub join_airtime: Duration,
    /// Off-time factor after every transmission (99 for 1%)
    pub duty_cycle_factor: u32,
    /// End of RX2 after the end of the uplink
    pub rx_windows: Duration,
    /// End of the second join accept window after the end of the request
    pub join_accept_windows: Duration,
}

impl SimMacConfig {
    pub const DEFAULT: Self = Self {
        join_accept_probability: 0.7,
        join_attempts_per_failure: 3,
        join_backoff: Duration::secs(10),
        max_join_backoff: Duration::secs(160),
        downlink_probability: 0.05,
        data_airtime: Duration::millis(185),
        join_airtime: Duration::millis(206),
        duty_cycle_factor: 99,
        rx_windows: Duration::secs(2),
        join_accept_windows: Duration::secs(6),
    };
}

impl Default for SimMacConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimMacError {
    /// A data frame is already queued or in flight
    Busy,
    /// Payload larger than the data rate allows
    TooLong(usize),
    /// FPort 0 is reserved for MAC commands, 224 and up for the stack
    InvalidPort(u8),
}

impl fmt::Display for SimMacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "TX/RX cycle pending"),
            Self::TooLong(len) => write!(f, "payload of {} bytes exceeds {}", len, MAX_UPLINK_LEN),
            Self::InvalidPort(port) => write!(f, "port {} not available to applications", port),
        }
    }
}

impl core::error::Error for SimMacError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    None,
    Joining,
    Joined,
}

/// Work the engine has scheduled for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SendJoinRequest,
    JoinAccepted,
    JoinUnanswered,
    SendData,
    RxWindowsClosed,
}

#[derive(Debug, Clone)]
struct Frame {
    port: u8,
    payload: Vec<u8, MAX_UPLINK_LEN>,
}

pub struct SimMac {
    config: SimMacConfig,
    rng: StdRng,
    now: Instant,
    session: Session,
    link_check: bool,
    frame: Option<Frame>,
    step: Option<(Instant, Step)>,
    channel_free_at: Instant,
    unanswered_joins: u32,
    frame_counter: u32,
    events: Deque<MacEvent, EVENT_QUEUE_LEN>,
}

impl SimMac {
    pub fn new(config: SimMacConfig, seed: u64, now: Instant) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            now,
            session: Session::None,
            link_check: true,
            frame: None,
            step: None,
            channel_free_at: now,
            unanswered_joins: 0,
            frame_counter: 0,
            events: Deque::new(),
        }
    }

    /// Uplink frame counter, frames that went on air since the join
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn link_check(&self) -> bool {
        self.link_check
    }

    fn emit(&mut self, event: MacEvent) {
        trace!("[mac] {}", event.name());
        if self.events.push_back(event).is_err() {
            // The node drains the queue on every poll, it never fills up
            debug!("[mac] event queue full, dropping event");
        }
    }

    fn schedule(&mut self, at: Instant, step: Step) {
        self.step = Some((at, step));
    }

    /// Earliest time the channel may be used, not before `now`
    fn next_slot(&self) -> Instant {
        self.channel_free_at.max(self.now)
    }

    /// Account airtime plus the duty-cycle off-time, returns the end of TX
    fn occupy_channel(&mut self, airtime: Duration) -> Instant {
        let end = self.now + airtime;
        self.channel_free_at = end + airtime * self.config.duty_cycle_factor;
        end
    }

    fn start_join(&mut self) {
        self.session = Session::Joining;
        self.unanswered_joins = 0;
        self.emit(MacEvent::Joining);
        let at = self.next_slot();
        self.schedule(at, Step::SendJoinRequest);
    }

    fn join_backoff(&self) -> Duration {
        let doublings = self.unanswered_joins.saturating_sub(1).min(8);
        let backoff = self.config.join_backoff * (1u32 << doublings);
        backoff.min(self.config.max_join_backoff)
    }

    fn run_step(&mut self, step: Step) {
        match step {
            Step::SendJoinRequest => {
                self.emit(MacEvent::TxStart);
                let end = self.occupy_channel(self.config.join_airtime);
                let windows_end = end + self.config.join_accept_windows;
                if self.rng.gen_bool(self.config.join_accept_probability) {
                    self.schedule(windows_end, Step::JoinAccepted);
                } else {
                    self.schedule(windows_end, Step::JoinUnanswered);
                }
            }
            Step::JoinAccepted => {
                self.session = Session::Joined;
                self.unanswered_joins = 0;
                self.frame_counter = 0;
                // Stacks enable link checks after a join
                self.link_check = true;
                self.emit(MacEvent::Joined);
                if self.frame.is_some() {
                    let at = self.next_slot();
                    self.schedule(at, Step::SendData);
                }
            }
            Step::JoinUnanswered => {
                self.unanswered_joins += 1;
                self.emit(MacEvent::JoinTxComplete);
                if self.unanswered_joins % self.config.join_attempts_per_failure == 0 {
                    self.emit(MacEvent::JoinFailed);
                }
                let at = self.next_slot().max(self.now + self.join_backoff());
                debug!("[mac] join request unanswered, retry at {} ms", at.ticks());
                self.schedule(at, Step::SendJoinRequest);
            }
            Step::SendData => {
                self.emit(MacEvent::TxStart);
                let end = self.occupy_channel(self.config.data_airtime);
                self.frame_counter = self.frame_counter.wrapping_add(1);
                self.schedule(end + self.config.rx_windows, Step::RxWindowsClosed);
            }
            Step::RxWindowsClosed => {
                let frame = self.frame.take();
                let downlink = if self.rng.gen_bool(self.config.downlink_probability) {
                    Some(self.random_downlink())
                } else {
                    None
                };
                if let Some(frame) = frame {
                    debug!(
                        "[mac] FCnt {} sent {} bytes on port {}",
                        self.frame_counter,
                        frame.payload.len(),
                        frame.port
                    );
                }
                self.emit(MacEvent::TxComplete {
                    ack: false,
                    downlink,
                });
            }
        }
    }

    fn random_downlink(&mut self) -> Downlink {
        let mut payload = Vec::new();
        let len = self.rng.gen_range(1..=4);
        for _ in 0..len {
            // Capacity is far above four bytes
            let _ = payload.push(self.rng.gen());
        }
        Downlink {
            port: self.rng.gen_range(1..=223),
            payload,
        }
    }
}

impl LoraMac for SimMac {
    type Error = SimMacError;

    fn begin_join(&mut self) {
        if self.session == Session::None {
            self.start_join();
        }
    }

    fn submit(&mut self, port: u8, payload: &[u8]) -> Result<(), Self::Error> {
        if self.frame.is_some() {
            return Err(SimMacError::Busy);
        }
        if port == 0 || port >= 224 {
            return Err(SimMacError::InvalidPort(port));
        }
        let payload =
            Vec::from_slice(payload).map_err(|_| SimMacError::TooLong(payload.len()))?;
        self.frame = Some(Frame { port, payload });

        match self.session {
            Session::None => self.start_join(),
            Session::Joining => {}
            Session::Joined => {
                let at = self.next_slot();
                self.schedule(at, Step::SendData);
            }
        }
        Ok(())
    }

    fn is_tx_pending(&self) -> bool {
        self.frame.is_some()
    }

    fn set_link_check(&mut self, enabled: bool) {
        debug!("[mac] link check {}", if enabled { "on" } else { "off" });
        self.link_check = enabled;
    }

    fn poll_event(&mut self, now: Instant) -> Option<MacEvent> {
        self.now = self.now.max(now);
        while let Some((at, step)) = self.step {
            if at > self.now {
                break;
            }
            self.step = None;
            self.run_step(step);
            if !self.events.is_empty() {
                break;
            }
        }
        self.events.pop_front()
    }

    fn next_wakeup(&self) -> Option<Instant> {
        if !self.events.is_empty() {
            return Some(self.now);
        }
        self.step.map(|(at, _)| at)
    }
}
