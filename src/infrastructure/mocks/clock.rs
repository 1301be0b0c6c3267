//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Manually driven clock.
///
/// Lets tests open a rate-limit window, jump past its `reset_at`, and
/// observe the rollover without sleeping.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-helpers")] {
/// use eunpa_salon::infrastructure::mocks::MockClock;
/// use eunpa_salon::application::ports::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
///
/// clock.advance(Duration::from_secs(61));
/// assert_eq!(clock.now(), start + Duration::from_secs(61));
/// # }
/// ```
///
/// Clones share the same time, so a clone handed to a limiter can be
/// advanced from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Create a mock clock starting at the real current instant.
    pub fn starting_now() -> Self {
        Self::new(Instant::now())
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time += duration;
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, seconds: u64) {
        self.advance(Duration::from_secs(seconds));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let start = Instant::now();
        let clock = MockClock::new(start);
        let shared = clock.clone();

        assert_eq!(clock.now(), start);
        shared.advance_secs(10);
        assert_eq!(clock.now(), start + Duration::from_secs(10));
        clock.advance(Duration::from_millis(500));
        assert_eq!(shared.now(), start + Duration::from_millis(10_500));
    }
}
