//! Node configuration
//!
//! Everything here is fixed at build time. A [`NodeConfig`] is handed to the
//! node once and never changes while it runs.

use hal_abstractions::{Duration, Resolution};

/// Wire layout revision, also used as the uplink FPort
pub const SCHEMA_REVISION: u8 = 3;

/// Identifier of this node inside the payload
pub const DEVICE_ID: u8 = 1;

/// Time from a harvest to the next conversion trigger
///
/// One full acquisition cycle lasts `SETTLE_DELAY + SAMPLE_PERIOD`.
pub const SAMPLE_PERIOD: Duration = Duration::secs(28);

/// Time between starting a conversion and reading it back
pub const SETTLE_DELAY: Duration = Duration::secs(2);

/// Time between a completed uplink cycle and the next transmit attempt
///
/// The effective interval may become longer due to duty-cycle limitations.
pub const TX_INTERVAL: Duration = Duration::secs(5 * 60);

/// Probe resolution (0.25 °C steps)
pub const RESOLUTION: Resolution = Resolution::Bits10;

/// LED blinks performed while the boot conversion runs
pub const BOOT_BLINKS: u8 = 10;

/// On and off time of a single boot blink
pub const BOOT_BLINK_HALF_PERIOD: Duration = Duration::millis(50);

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Settle delay shorter than the probe's conversion time
    SettleTooShort,
    /// Sample period does not exceed the settle delay
    SamplePeriodTooShort,
    /// Transmit interval of zero
    ZeroTxInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SettleTooShort => write!(f, "Settle delay shorter than conversion time"),
            Self::SamplePeriodTooShort => write!(f, "Sample period not longer than settle delay"),
            Self::ZeroTxInterval => write!(f, "Transmit interval is zero"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Node configuration
#[derive(Debug, Clone, Copy)]
pub struct NodeConfig {
    /// Payload layout revision and uplink FPort
    pub schema_revision: u8,
    /// Device identifier carried in every payload
    pub device_id: u8,
    /// Harvest-to-next-trigger period
    pub sample_period: Duration,
    /// Trigger-to-harvest delay
    pub settle_delay: Duration,
    /// TxComplete-to-next-attempt period
    pub tx_interval: Duration,
    /// Probe resolution applied at boot
    pub resolution: Resolution,
    /// Number of boot blinks
    pub boot_blinks: u8,
    /// On/off time of one boot blink
    pub boot_blink_half_period: Duration,
}

impl NodeConfig {
    /// Build-time defaults
    pub const DEFAULT: Self = Self {
        schema_revision: SCHEMA_REVISION,
        device_id: DEVICE_ID,
        sample_period: SAMPLE_PERIOD,
        settle_delay: SETTLE_DELAY,
        tx_interval: TX_INTERVAL,
        resolution: RESOLUTION,
        boot_blinks: BOOT_BLINKS,
        boot_blink_half_period: BOOT_BLINK_HALF_PERIOD,
    };

    /// Check the timing relations the schedulers rely on
    pub const fn validate(&self) -> Result<(), ConfigError> {
        let settle = self.settle_delay.ticks();
        if settle < self.resolution.conversion_time().ticks() {
            return Err(ConfigError::SettleTooShort);
        }
        if self.sample_period.ticks() <= settle {
            return Err(ConfigError::SamplePeriodTooShort);
        }
        if self.tx_interval.ticks() == 0 {
            return Err(ConfigError::ZeroTxInterval);
        }
        Ok(())
    }

    /// Total time spent blinking during boot
    pub const fn boot_blink_time(&self) -> Duration {
        Duration::from_ticks(self.boot_blink_half_period.ticks() * 2 * self.boot_blinks as u64)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = assert!(NodeConfig::DEFAULT.validate().is_ok());
