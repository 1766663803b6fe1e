//! The node context and its cooperative run loop
//!
//! [`Node`] owns every piece of state the schedulers share: the reading
//! record, the job table and the board collaborators. Handlers borrow what
//! they need from it for the duration of one call, so there is exactly one
//! writer of the record at any time and no locking.
//!
//! ## Usage
//! ```ignore
//! let mut node = Node::new(NodeConfig::DEFAULT, probe, mac, display, led)?;
//! node.boot(now(), &mut delay);
//! loop {
//!     let wake = node.run_once(now());
//!     sleep_until(wake);
//! }
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use hal_abstractions::{Instant, LoraMac, StatusDisplay, TemperatureProbe};

use crate::acquisition::AcquisitionScheduler;
use crate::config::{ConfigError, NodeConfig};
use crate::dispatcher::EventDispatcher;
use crate::job::{Job, JobKind, JobTable};
use crate::record::ReadingRecord;
use crate::transmission::TransmissionScheduler;

/// Snapshot of what the node has observed, for display and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeStatus {
    pub joined: bool,
    pub last_event: Option<&'static str>,
    pub harvests: u32,
    pub frames_queued: u32,
    pub attempts_skipped: u32,
    pub tx_completed: u32,
    pub acks: u32,
    pub downlinks: u32,
    pub join_failures: u32,
}

pub struct Node<P, M, D, L> {
    config: NodeConfig,
    record: ReadingRecord,
    jobs: JobTable,
    acquisition: AcquisitionScheduler,
    transmission: TransmissionScheduler,
    dispatcher: EventDispatcher,
    probe: P,
    mac: M,
    display: D,
    led: L,
}

impl<P, M, D, L> Node<P, M, D, L>
where
    P: TemperatureProbe,
    M: LoraMac,
    D: StatusDisplay,
    L: OutputPin,
{
    pub fn new(
        config: NodeConfig,
        probe: P,
        mac: M,
        display: D,
        led: L,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            record: ReadingRecord::new(config.schema_revision, config.device_id),
            jobs: JobTable::new(),
            acquisition: AcquisitionScheduler::new(&config),
            transmission: TransmissionScheduler::new(&config),
            dispatcher: EventDispatcher::new(&config),
            probe,
            mac,
            display,
            led,
        })
    }

    /// Bring the node up and start both cadences
    ///
    /// Runs one trigger/harvest pair synchronously, blinking the LED while
    /// the conversion settles, so the record holds a real reading before the
    /// first transmit attempt. Then starts the join and arms the first
    /// transmit attempt and acquisition trigger, both due at `now`.
    ///
    /// Call once; a second call arms duplicate jobs and panics.
    pub fn boot<T: DelayNs>(&mut self, now: Instant, delay: &mut T) {
        info!(
            "OTAA node starting: device {} revision {}",
            self.config.device_id, self.config.schema_revision
        );

        self.probe.set_resolution(self.config.resolution);
        self.acquisition.start_conversion(&mut self.probe);

        let half_period = millis_u32(self.config.boot_blink_half_period.ticks());
        for _ in 0..self.config.boot_blinks {
            self.led.set_high().ok();
            delay.delay_ms(half_period);
            self.led.set_low().ok();
            delay.delay_ms(half_period);
        }
        let blinked = self.config.boot_blink_time().ticks();
        let settle = self.config.settle_delay.ticks();
        if settle > blinked {
            delay.delay_ms(millis_u32(settle - blinked));
        }

        self.acquisition
            .harvest(&mut self.probe, &mut self.record, &mut self.display);

        // Sending would join implicitly, starting here gets the session going sooner
        self.mac.begin_join();

        self.jobs.arm(JobKind::TransmitAttempt, now);
        self.jobs.arm(JobKind::AcquisitionTrigger, now);
    }

    /// One pass of the run loop
    ///
    /// Dispatches every MAC event available at `now`, then runs every job
    /// due at `now` in due order. Returns when the loop next needs to run.
    pub fn run_once(&mut self, now: Instant) -> Option<Instant> {
        while let Some(event) = self.mac.poll_event(now) {
            self.dispatcher.dispatch(
                now,
                event,
                &mut self.mac,
                &mut self.jobs,
                &mut self.led,
            );
        }

        while let Some(job) = self.jobs.pop_due(now) {
            self.run_job(now, job);
        }

        self.next_wakeup()
    }

    fn run_job(&mut self, now: Instant, job: Job) {
        debug!("{}: running {:?}", now.ticks(), job.kind);
        match job.kind {
            JobKind::AcquisitionTrigger => {
                self.acquisition
                    .on_trigger(now, &mut self.probe, &mut self.jobs);
            }
            JobKind::AcquisitionHarvest => {
                self.acquisition.on_harvest(
                    now,
                    &mut self.probe,
                    &mut self.record,
                    &mut self.display,
                    &mut self.jobs,
                );
            }
            JobKind::TransmitAttempt => {
                self.transmission
                    .on_transmit_attempt(&self.record, &mut self.mac, &mut self.led);
            }
        }
    }

    /// Earliest of the next due job and the MAC's next wake-up
    pub fn next_wakeup(&self) -> Option<Instant> {
        match (self.jobs.next_due(), self.mac.next_wakeup()) {
            (Some(job), Some(mac)) => Some(job.min(mac)),
            (job, mac) => job.or(mac),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn record(&self) -> &ReadingRecord {
        &self.record
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn mac(&self) -> &M {
        &self.mac
    }

    pub fn mac_mut(&mut self) -> &mut M {
        &mut self.mac
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            joined: self.dispatcher.is_joined(),
            last_event: self.dispatcher.last_event(),
            harvests: self.acquisition.harvests(),
            frames_queued: self.transmission.queued(),
            attempts_skipped: self.transmission.skipped(),
            tx_completed: self.dispatcher.tx_completed(),
            acks: self.dispatcher.acks(),
            downlinks: self.dispatcher.downlinks(),
            join_failures: self.dispatcher.join_failures(),
        }
    }
}

fn millis_u32(ms: u64) -> u32 {
    u32::try_from(ms).unwrap_or(u32::MAX)
}
