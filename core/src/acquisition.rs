//! Acquisition scheduler
//!
//! Keeps the reading record fresh on its own cadence:
//!
//! ```text
//!   trigger ──settle_delay──▶ harvest ──sample_period──▶ trigger ...
//! ```
//!
//! Each handler arms the job for the opposite phase, so a harvest can never
//! run before its trigger and the gap between them is always the settle delay.

use hal_abstractions::{Duration, Instant, StatusDisplay, TemperatureProbe};

use crate::config::NodeConfig;
use crate::job::{JobKind, JobTable};
use crate::record::ReadingRecord;

/// Where the acquisition cycle currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionPhase {
    /// No conversion started yet
    Idle,
    /// Conversion running, harvest pending
    AwaitingConversion,
    /// Record updated, next trigger pending
    AwaitingNextTrigger,
}

pub struct AcquisitionScheduler {
    phase: AcquisitionPhase,
    settle_delay: Duration,
    sample_period: Duration,
    harvests: u32,
}

impl AcquisitionScheduler {
    pub const fn new(config: &NodeConfig) -> Self {
        Self {
            phase: AcquisitionPhase::Idle,
            settle_delay: config.settle_delay,
            sample_period: config.sample_period,
            harvests: 0,
        }
    }

    pub fn phase(&self) -> AcquisitionPhase {
        self.phase
    }

    /// Completed harvests since boot, including the boot harvest
    pub fn harvests(&self) -> u32 {
        self.harvests
    }

    /// `AcquisitionTrigger` job: start a conversion and arm its harvest
    pub fn on_trigger<P: TemperatureProbe>(
        &mut self,
        now: Instant,
        probe: &mut P,
        jobs: &mut JobTable,
    ) {
        self.start_conversion(probe);
        jobs.arm(JobKind::AcquisitionHarvest, now + self.settle_delay);
    }

    /// `AcquisitionHarvest` job: store the converted value and arm the next trigger
    pub fn on_harvest<P: TemperatureProbe, D: StatusDisplay>(
        &mut self,
        now: Instant,
        probe: &mut P,
        record: &mut ReadingRecord,
        display: &mut D,
        jobs: &mut JobTable,
    ) {
        self.harvest(probe, record, display);
        jobs.arm(JobKind::AcquisitionTrigger, now + self.sample_period);
    }

    pub(crate) fn start_conversion<P: TemperatureProbe>(&mut self, probe: &mut P) {
        probe.start_conversion();
        self.phase = AcquisitionPhase::AwaitingConversion;
        debug!("Trigger temperature conversion");
    }

    pub(crate) fn harvest<P: TemperatureProbe, D: StatusDisplay>(
        &mut self,
        probe: &mut P,
        record: &mut ReadingRecord,
        display: &mut D,
    ) {
        record.temperature_raw = probe.read_converted();
        self.phase = AcquisitionPhase::AwaitingNextTrigger;
        self.harvests = self.harvests.wrapping_add(1);

        if record.is_disconnected() {
            // Transmitted as-is, the decoder sees -55 °C
            warn!("Probe not responding, raw value {}", record.temperature_raw);
        } else {
            info!(
                "Read temperature raw = {} ({} C)",
                record.temperature_raw,
                record.celsius()
            );
        }
        display.show(record.status_line().as_str());
    }
}
