//! Front panel of the simulated board: status line and activity LED
//!
//! Both end up in the log, the display at info and the LED at debug level.
//! The display keeps what a 16-column panel would actually show.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use hal_abstractions::{StatusDisplay, STATUS_TEXT_LEN};
use log::{debug, info, warn};

/// Status display printing every line it is handed
#[derive(Debug, Default)]
pub struct LogDisplay {
    last: heapless::String<STATUS_TEXT_LEN>,
}

impl StatusDisplay for LogDisplay {
    fn show(&mut self, text: &str) {
        if text.chars().count() > STATUS_TEXT_LEN {
            warn!("Status line wider than the panel: {:?}", text);
        }
        self.last.clear();
        for c in text.chars() {
            if self.last.push(c).is_err() {
                break;
            }
        }
        info!("[display] {}", self.last);
    }
}

/// Activity LED, lit while an uplink is in flight
#[derive(Debug, Default)]
pub struct SimLed {
    lit: bool,
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.lit {
            debug!("[led] off");
        }
        self.lit = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.lit {
            debug!("[led] on");
        }
        self.lit = true;
        Ok(())
    }
}
