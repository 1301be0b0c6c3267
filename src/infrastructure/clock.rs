//! Wall-clock adapter for the `Clock` port.
//!
//! Windows are measured on the monotonic clock, so system time adjustments
//! never shorten or extend an open window. Tests swap in `MockClock`
//! (see `crate::infrastructure::mocks`).

use crate::application::ports::Clock;
use std::time::Instant;

/// Monotonic process clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let readings: Vec<Instant> = (0..100).map(|_| clock.now()).collect();
        assert!(readings.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
