//! Bridge between the embassy host clock and the node's millisecond time base

use hal_abstractions::Instant;

/// Milliseconds since the embassy time driver started
pub fn now() -> Instant {
    Instant::from_ticks(embassy_time::Instant::now().as_millis())
}

pub fn to_embassy(at: Instant) -> embassy_time::Instant {
    embassy_time::Instant::from_millis(at.ticks())
}
