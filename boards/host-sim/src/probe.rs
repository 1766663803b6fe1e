//! Simulated one-wire temperature probe
//!
//! Follows a slow random walk around room temperature and behaves like a
//! DS18B20 on the bus: results are quantized to the configured resolution,
//! a read before the conversion time has passed returns the power-on value
//! (85 °C), and a missing device reads as [`DISCONNECTED_RAW`].

use embassy_time::{Duration, Instant};
use hal_abstractions::{Resolution, TemperatureProbe, DISCONNECTED_RAW, RAW_PER_DEGREE};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scratchpad content after power-up, 85 °C
pub const POWER_ON_RAW: i16 = 85 * RAW_PER_DEGREE;

const START_CELSIUS: f32 = 21.0;
const MAX_STEP_CELSIUS: f32 = 0.15;
const MIN_CELSIUS: f32 = 5.0;
const MAX_CELSIUS: f32 = 35.0;

pub struct SimProbe {
    rng: StdRng,
    attached: bool,
    resolution: Resolution,
    celsius: f32,
    scratchpad: i16,
    conversion_started: Option<Instant>,
}

impl SimProbe {
    pub fn new(seed: u64, attached: bool) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            attached,
            resolution: Resolution::Bits12,
            celsius: START_CELSIUS,
            scratchpad: POWER_ON_RAW,
            conversion_started: None,
        }
    }

    fn quantize(&self, celsius: f32) -> i16 {
        let raw = (celsius * f32::from(RAW_PER_DEGREE)) as i16;
        let step = self.resolution.step_raw();
        raw.div_euclid(step) * step
    }

    fn conversion_time(&self) -> Duration {
        Duration::from_millis(self.resolution.conversion_time().ticks())
    }
}

impl TemperatureProbe for SimProbe {
    fn set_resolution(&mut self, resolution: Resolution) {
        debug!("[probe] resolution {} bits", resolution.bits());
        self.resolution = resolution;
    }

    fn start_conversion(&mut self) {
        let step = self.rng.gen_range(-MAX_STEP_CELSIUS..=MAX_STEP_CELSIUS);
        self.celsius = (self.celsius + step).clamp(MIN_CELSIUS, MAX_CELSIUS);
        self.conversion_started = Some(Instant::now());
    }

    fn read_converted(&mut self) -> i16 {
        if !self.attached {
            return DISCONNECTED_RAW;
        }
        if let Some(started) = self.conversion_started {
            if started.elapsed() >= self.conversion_time() {
                self.scratchpad = self.quantize(self.celsius);
                self.conversion_started = None;
            }
        }
        self.scratchpad
    }
}
