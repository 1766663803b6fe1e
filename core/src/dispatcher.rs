//! MAC event dispatcher
//!
//! Single consumer of the MAC event stream. Every event is logged and folded
//! into the observable status; only `TxComplete` affects scheduling, by
//! arming the next transmit attempt `tx_interval` later.
//!
//! Join failures get no special treatment: the MAC retries on its own and
//! the transmit cadence keeps running, the busy check suppressing attempts
//! while the session is not up.

use embedded_hal::digital::OutputPin;
use hal_abstractions::{Duration, Instant, LoraMac, MacEvent};

use crate::config::NodeConfig;
use crate::job::{JobKind, JobTable};

pub struct EventDispatcher {
    tx_interval: Duration,
    joined: bool,
    last_event: Option<&'static str>,
    tx_completed: u32,
    acks: u32,
    downlinks: u32,
    join_failures: u32,
}

impl EventDispatcher {
    pub const fn new(config: &NodeConfig) -> Self {
        Self {
            tx_interval: config.tx_interval,
            joined: false,
            last_event: None,
            tx_completed: 0,
            acks: 0,
            downlinks: 0,
            join_failures: 0,
        }
    }

    /// A session is up, as far as the event stream has told us
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn last_event(&self) -> Option<&'static str> {
        self.last_event
    }

    pub fn tx_completed(&self) -> u32 {
        self.tx_completed
    }

    pub fn acks(&self) -> u32 {
        self.acks
    }

    pub fn downlinks(&self) -> u32 {
        self.downlinks
    }

    /// Join and rejoin failures reported by the MAC
    pub fn join_failures(&self) -> u32 {
        self.join_failures
    }

    pub fn dispatch<M: LoraMac, L: OutputPin>(
        &mut self,
        now: Instant,
        event: MacEvent,
        mac: &mut M,
        jobs: &mut JobTable,
        led: &mut L,
    ) {
        let stamp = now.ticks();
        let name = event.name();
        self.last_event = Some(name);

        match event {
            MacEvent::Joining => info!("{}: EV_JOINING", stamp),
            MacEvent::Joined => {
                info!("{}: EV_JOINED", stamp);
                self.joined = true;
                // Enabled by the MAC during join, not honoured by the network
                mac.set_link_check(false);
            }
            MacEvent::JoinFailed | MacEvent::RejoinFailed => {
                warn!("{}: {}", stamp, name);
                self.join_failures = self.join_failures.wrapping_add(1);
            }
            MacEvent::JoinTxComplete => info!("{}: EV_JOIN_TXCOMPLETE: no JoinAccept", stamp),
            MacEvent::TxComplete { ack, downlink } => {
                info!("{}: EV_TXCOMPLETE (includes waiting for RX windows)", stamp);
                self.tx_completed = self.tx_completed.wrapping_add(1);
                if ack {
                    info!("Received ack");
                    self.acks = self.acks.wrapping_add(1);
                }
                if let Some(downlink) = downlink {
                    info!(
                        "Received {} bytes of payload on port {}",
                        downlink.payload.len(),
                        downlink.port
                    );
                    self.downlinks = self.downlinks.wrapping_add(1);
                }
                self.arm_next_attempt(now, jobs);
                led.set_low().ok();
            }
            // Logging here wrecks RX timing
            MacEvent::RxStart => {}
            MacEvent::Unknown(code) => warn!("{}: Unknown event: {}", stamp, code),
            MacEvent::LinkDead => {
                warn!("{}: EV_LINK_DEAD", stamp);
            }
            _ => trace!("{}: {}", stamp, name),
        }
    }

    fn arm_next_attempt(&self, now: Instant, jobs: &mut JobTable) {
        // A MAC-originated uplink can complete while our attempt is still
        // pending; the next attempt still waits a full interval.
        jobs.rearm(JobKind::TransmitAttempt, now + self.tx_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLed, MockMac};
    use hal_abstractions::Downlink;

    fn at(ms: u64) -> Instant {
        Instant::from_ticks(ms)
    }

    struct Fixture {
        dispatcher: EventDispatcher,
        mac: MockMac,
        jobs: JobTable,
        led: MockLed,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dispatcher: EventDispatcher::new(&NodeConfig::DEFAULT),
                mac: MockMac::new(),
                jobs: JobTable::new(),
                led: MockLed::high(),
            }
        }

        fn dispatch(&mut self, now: Instant, event: MacEvent) {
            self.dispatcher
                .dispatch(now, event, &mut self.mac, &mut self.jobs, &mut self.led);
        }
    }

    #[test]
    fn test_tx_complete_arms_next_attempt() {
        let mut f = Fixture::new();
        f.dispatch(
            at(5_000),
            MacEvent::TxComplete {
                ack: false,
                downlink: None,
            },
        );

        assert_eq!(
            f.jobs.due(JobKind::TransmitAttempt),
            Some(at(5_000) + NodeConfig::DEFAULT.tx_interval)
        );
        assert!(!f.led.is_high);
        assert_eq!(f.dispatcher.tx_completed(), 1);
    }

    #[test]
    fn test_tx_complete_counts_ack_and_downlink() {
        let mut f = Fixture::new();
        let mut payload = heapless::Vec::new();
        payload.extend_from_slice(&[0xAA, 0xBB]).unwrap();
        f.dispatch(
            at(0),
            MacEvent::TxComplete {
                ack: true,
                downlink: Some(Downlink { port: 10, payload }),
            },
        );

        assert_eq!(f.dispatcher.acks(), 1);
        assert_eq!(f.dispatcher.downlinks(), 1);
        assert_eq!(f.dispatcher.last_event(), Some("EV_TXCOMPLETE"));
    }

    #[test]
    fn test_joined_disables_link_check() {
        let mut f = Fixture::new();
        f.dispatch(at(0), MacEvent::Joining);
        assert!(!f.dispatcher.is_joined());

        f.dispatch(at(6_000), MacEvent::Joined);

        assert!(f.dispatcher.is_joined());
        assert_eq!(f.mac.link_check, Some(false));
        assert!(f.jobs.is_empty());
    }

    #[test]
    fn test_join_failure_is_only_reported() {
        let mut f = Fixture::new();
        f.dispatch(at(0), MacEvent::JoinFailed);
        f.dispatch(at(1), MacEvent::RejoinFailed);

        assert_eq!(f.dispatcher.join_failures(), 2);
        assert!(f.jobs.is_empty());
        assert_eq!(f.mac.joins_started, 0);
        assert!(f.mac.submissions.is_empty());
    }

    #[test]
    fn test_other_events_do_not_schedule() {
        let mut f = Fixture::new();
        for event in [
            MacEvent::ScanTimeout,
            MacEvent::BeaconFound,
            MacEvent::BeaconMissed,
            MacEvent::BeaconTracked,
            MacEvent::Rfu1,
            MacEvent::LostTsync,
            MacEvent::Reset,
            MacEvent::RxComplete,
            MacEvent::LinkDead,
            MacEvent::LinkAlive,
            MacEvent::TxStart,
            MacEvent::TxCanceled,
            MacEvent::RxStart,
            MacEvent::JoinTxComplete,
            MacEvent::Unknown(42),
        ] {
            f.dispatch(at(0), event);
        }

        assert!(f.jobs.is_empty());
        assert!(f.led.is_high);
        assert_eq!(f.dispatcher.last_event(), Some("EV_UNKNOWN"));
    }

    #[test]
    fn test_tx_complete_with_attempt_pending_pushes_it_back() {
        let mut f = Fixture::new();
        f.jobs.arm(JobKind::TransmitAttempt, at(100));

        f.dispatch(
            at(50),
            MacEvent::TxComplete {
                ack: false,
                downlink: None,
            },
        );

        assert_eq!(
            f.jobs.due(JobKind::TransmitAttempt),
            Some(at(50) + NodeConfig::DEFAULT.tx_interval)
        );
        assert_eq!(f.jobs.pop_due(at(100)), None);
    }
}
