//! Millisecond time base shared by the core and the boards
//!
//! The core never reads a clock itself. Boards sample their monotonic timer
//! and hand the value in as an [`Instant`].

/// Point in time on the node's monotonic millisecond timeline
pub type Instant = fugit::Instant<u64, 1, 1000>;

/// Span on the node's monotonic millisecond timeline
pub type Duration = fugit::Duration<u64, 1, 1000>;

pub use fugit::ExtU64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_arithmetic() {
        let start = Instant::from_ticks(1_000);
        let later = start + Duration::secs(2);
        assert_eq!(later.ticks(), 3_000);
        assert_eq!(later - start, Duration::millis(2_000));
        assert!(later > start);
    }
}
