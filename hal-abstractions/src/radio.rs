//! LoRaWAN MAC engine contract
//!
//! The MAC is an opaque state machine: it owns the session (OTAA join, frame
//! counters, duty-cycle budget, RX windows) and reports progress through a
//! stream of [`MacEvent`]s. The node only submits frames, asks whether a
//! TX/RX cycle is pending and drains events.

use core::fmt::Debug;

use heapless::Vec;

use crate::time::Instant;

/// Largest application payload a downlink can carry (DR7, EU868)
pub const MAX_DOWNLINK_LEN: usize = 242;

/// Application data received in an RX window
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Downlink {
    /// FPort the network sent the data on
    pub port: u8,
    /// FRMPayload bytes
    pub payload: Vec<u8, MAX_DOWNLINK_LEN>,
}

/// Events reported by the MAC engine, in the order it produced them
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacEvent {
    ScanTimeout,
    BeaconFound,
    BeaconMissed,
    BeaconTracked,
    /// Join procedure started
    Joining,
    /// Join accept received, session keys derived
    Joined,
    Rfu1,
    /// Join attempt gave up; the MAC keeps retrying on its own schedule
    JoinFailed,
    RejoinFailed,
    /// Uplink cycle finished, including both RX windows
    TxComplete {
        /// The frame was confirmed by the network
        ack: bool,
        /// Data received in one of the RX windows
        downlink: Option<Downlink>,
    },
    LostTsync,
    Reset,
    /// Data received in a ping slot
    RxComplete,
    LinkDead,
    LinkAlive,
    TxStart,
    TxCanceled,
    RxStart,
    /// Join request sent but no join accept received
    JoinTxComplete,
    /// Event code this node does not know about
    Unknown(u8),
}

impl MacEvent {
    /// Short name for log output
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScanTimeout => "EV_SCAN_TIMEOUT",
            Self::BeaconFound => "EV_BEACON_FOUND",
            Self::BeaconMissed => "EV_BEACON_MISSED",
            Self::BeaconTracked => "EV_BEACON_TRACKED",
            Self::Joining => "EV_JOINING",
            Self::Joined => "EV_JOINED",
            Self::Rfu1 => "EV_RFU1",
            Self::JoinFailed => "EV_JOIN_FAILED",
            Self::RejoinFailed => "EV_REJOIN_FAILED",
            Self::TxComplete { .. } => "EV_TXCOMPLETE",
            Self::LostTsync => "EV_LOST_TSYNC",
            Self::Reset => "EV_RESET",
            Self::RxComplete => "EV_RXCOMPLETE",
            Self::LinkDead => "EV_LINK_DEAD",
            Self::LinkAlive => "EV_LINK_ALIVE",
            Self::TxStart => "EV_TXSTART",
            Self::TxCanceled => "EV_TXCANCELED",
            Self::RxStart => "EV_RXSTART",
            Self::JoinTxComplete => "EV_JOIN_TXCOMPLETE",
            Self::Unknown(_) => "EV_UNKNOWN",
        }
    }
}

/// LoRaWAN MAC engine
pub trait LoraMac {
    #[cfg(feature = "defmt")]
    type Error: Debug + defmt::Format;

    #[cfg(not(feature = "defmt"))]
    type Error: Debug;

    /// Start OTAA session establishment if no session exists yet
    fn begin_join(&mut self);

    /// Queue an unconfirmed uplink on `port`
    ///
    /// Success means "queued", not "sent": the MAC schedules airtime on its
    /// own duty-cycle budget and joins first if needed.
    fn submit(&mut self, port: u8, payload: &[u8]) -> Result<(), Self::Error>;

    /// A TX/RX cycle is queued or in progress
    fn is_tx_pending(&self) -> bool;

    /// Enable or disable periodic LinkCheckReq piggybacking
    fn set_link_check(&mut self, enabled: bool);

    /// Advance the MAC to `now` and take the next event it produced
    fn poll_event(&mut self, now: Instant) -> Option<MacEvent>;

    /// Earliest time the MAC needs to be polled again, if any
    fn next_wakeup(&self) -> Option<Instant>;
}
